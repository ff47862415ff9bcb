//! Locating Zarr hierarchies on the local filesystem.
//!
//! Nothing here reads array data or parses metadata:
//! folders are classified by the presence of well-known marker files.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Classifies folders relative to Zarr hierarchy boundaries.
///
/// The default recognises Zarr v2 (`.zgroup`, `.zattrs`, `.zarray`) and
/// v3 (`zarr.json`) nodes, and ignores `OME` subfolders when looking for an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResolver {
    /// A folder containing any of these files is part of a Zarr hierarchy.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
    /// Subfolders with these names are never image candidates.
    #[serde(default = "default_ignored_subfolders")]
    pub ignored_subfolders: Vec<String>,
}

fn default_markers() -> Vec<String> {
    [".zgroup", ".zattrs", ".zarray", "zarr.json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ignored_subfolders() -> Vec<String> {
    vec!["OME".to_owned()]
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            ignored_subfolders: default_ignored_subfolders(),
        }
    }
}

/// Where a path sits within a Zarr hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZarrPathInfo {
    /// Outermost folder of the hierarchy.
    pub root_folder: PathBuf,
    /// The single image-bearing folder, if unambiguous.
    pub image_folder: Option<PathBuf>,
    /// Folder names leading from `root_folder` down to the resolved path.
    pub relative_segments: Vec<String>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn with_ignored_subfolder(mut self, name: impl Into<String>) -> Self {
        self.ignored_subfolders.push(name.into());
        self
    }

    /// Whether the folder directly contains any Zarr marker file.
    pub fn is_zarr_folder(&self, folder: &Path) -> bool {
        // An empty relative path would resolve markers against the working directory.
        if folder.as_os_str().is_empty() {
            return false;
        }
        self.markers.iter().any(|m| folder.join(m).exists())
    }

    /// The chain of Zarr folders from `path` upwards, innermost first.
    fn zarr_ancestors<'a>(&self, path: &'a Path) -> Vec<&'a Path> {
        let visited: Vec<_> = path
            .ancestors()
            .take_while(|p| self.is_zarr_folder(p))
            .collect();
        log::trace!(
            "{} Zarr folder(s) at or above {}",
            visited.len(),
            path.display()
        );
        visited
    }

    /// Walk upwards while folders are Zarr folders, returning the outermost one.
    ///
    /// Returns None if `path` is not itself a Zarr folder.
    pub fn find_root_folder(&self, path: &Path) -> Option<PathBuf> {
        self.zarr_ancestors(path).last().map(|p| p.to_path_buf())
    }

    /// Find the folder holding one concrete image below the hierarchy root.
    ///
    /// If `path` lies below the root, this is the root's child on the way to `path`.
    /// If `path` is the root, it is the root's only subfolder (ignoring
    /// [PathResolver::ignored_subfolders]).
    /// Returns None if there are several candidates, none,
    /// or the root's subfolders cannot be listed.
    pub fn find_image_root_folder(&self, path: &Path) -> Option<PathBuf> {
        let visited = self.zarr_ancestors(path);
        let (top, below) = match visited.as_slice() {
            [] => return None,
            [.., below, top] => (*top, Some(*below)),
            [top] => (*top, None),
        };
        if let Some(below) = below {
            return Some(below.to_path_buf());
        }

        let entries = match fs::read_dir(top) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("could not list {}: {e}", top.display());
                return None;
            }
        };
        let mut candidates = Vec::with_capacity(2);
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("could not list {}: {e}", top.display());
                    return None;
                }
            };
            let candidate = entry.path();
            if !candidate.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if self.ignored_subfolders.iter().any(|i| name == i.as_str()) {
                continue;
            }
            candidates.push(candidate);
            if candidates.len() > 1 {
                log::debug!(
                    "{} has several image candidates; cannot pick one",
                    top.display()
                );
                return None;
            }
        }
        candidates.pop()
    }

    /// Resolve root, image folder and relative segments for a path in one go.
    ///
    /// Returns None if `path` is not within a Zarr hierarchy.
    pub fn resolve(&self, path: &Path) -> Option<ZarrPathInfo> {
        let root_folder = self.find_root_folder(path)?;
        let image_folder = self.find_image_root_folder(path);
        // path descends from its own ancestor, so this cannot fail
        let relative_segments = relative_path_elements(&root_folder, path).ok()?;
        Some(ZarrPathInfo {
            root_folder,
            image_folder,
            relative_segments,
        })
    }
}

/// [PathResolver::is_zarr_folder] with the default markers.
pub fn is_zarr_folder(folder: &Path) -> bool {
    PathResolver::default().is_zarr_folder(folder)
}

/// [PathResolver::find_root_folder] with the default markers.
pub fn find_root_folder(path: &Path) -> Option<PathBuf> {
    PathResolver::default().find_root_folder(path)
}

/// [PathResolver::find_image_root_folder] with the default markers.
pub fn find_image_root_folder(path: &Path) -> Option<PathBuf> {
    PathResolver::default().find_image_root_folder(path)
}

/// Folder names to descend through from `ancestor` to reach `descendant`.
///
/// Empty if the paths are equal.
/// Comparison is lexical; paths are not canonicalized.
pub fn relative_path_elements(ancestor: &Path, descendant: &Path) -> crate::Result<Vec<String>> {
    let relative = descendant
        .strip_prefix(ancestor)
        .map_err(|_| Error::NotADescendant {
            ancestor: ancestor.to_path_buf(),
            descendant: descendant.to_path_buf(),
        })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect())
}

/// Pick the finest level of a pyramid by naming convention.
///
/// Returns the first name ending in `s0`, otherwise the first name;
/// None only if `names` is empty.
/// Scale metadata is not consulted.
pub fn find_highest_resolution_by_name<S: AsRef<str>>(names: &[S]) -> Option<&str> {
    names
        .iter()
        .map(AsRef::as_ref)
        .find(|n| n.ends_with("s0"))
        .or_else(|| names.first().map(AsRef::as_ref))
}
