//! Reading OME-NGFF metadata from Zarr hierarchies on the local filesystem.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::{Map, Value};
use zarrs::{array::Array, filesystem::FilesystemStore, group::Group};

use crate::{
    metadata::Multiscales,
    path::{PathResolver, ZarrPathInfo},
};

/// A multiscale image located from an arbitrary path within its hierarchy.
#[derive(Debug, Clone)]
pub struct OmeZarrImage {
    pub info: ZarrPathInfo,
    /// The group holding the `multiscales` attributes.
    pub folder: PathBuf,
    pub multiscales: Multiscales,
}

fn open_store(folder: &Path) -> crate::Result<Arc<FilesystemStore>> {
    let store = FilesystemStore::new(folder).map_err(crate::Error::wrap)?;
    Ok(Arc::new(store))
}

/// Read the attributes of the group rooted at `folder`.
///
/// Works for both `.zattrs` (Zarr v2) and `zarr.json` (Zarr v3).
pub fn read_attributes(folder: &Path) -> crate::Result<Map<String, Value>> {
    let store = open_store(folder)?;
    let group = Group::open(store, "/").map_err(crate::Error::wrap)?;
    log::trace!("read attributes of {}", folder.display());
    Ok(group.attributes().clone())
}

/// Whether the attributes carry `multiscales`, directly or under `ome`.
pub fn has_multiscales(attributes: &Map<String, Value>) -> bool {
    attributes.contains_key("multiscales")
        || matches!(
            attributes.get("ome"),
            Some(Value::Object(ome)) if ome.contains_key("multiscales")
        )
}

/// Parse the multiscales of the group at `folder`,
/// checking every level's array rank against the axes.
pub fn open_multiscales(folder: &Path) -> crate::Result<Multiscales> {
    let store = open_store(folder)?;
    let group = Group::open(store.clone(), "/").map_err(crate::Error::wrap)?;
    let multiscales = Multiscales::parse(group.attributes())?;

    for dataset in multiscales.datasets() {
        let node_path = format!("/{}", dataset.path.trim_matches('/'));
        let array = Array::open(store.clone(), &node_path).map_err(crate::Error::wrap)?;
        log::trace!(
            "level {} of {} has shape {:?}",
            dataset.path,
            folder.display(),
            array.shape()
        );
        multiscales.validate_rank(array.shape().len())?;
    }
    Ok(multiscales)
}

/// The innermost group at or above `path`, up to the hierarchy root,
/// whose attributes carry `multiscales`.
fn find_multiscales_group(path: &Path, info: &ZarrPathInfo) -> Option<PathBuf> {
    path.ancestors()
        .take(info.relative_segments.len() + 1)
        .find(|folder| match read_attributes(folder) {
            Ok(attributes) => has_multiscales(&attributes),
            Err(e) => {
                log::trace!("{} is not a readable group: {e}", folder.display());
                false
            }
        })
        .map(Path::to_path_buf)
}

/// Locate and open the multiscale image a path points into.
///
/// The innermost group at or above the path carrying `multiscales` is used;
/// failing that, the unambiguous image folder of its hierarchy.
/// Returns `Ok(None)` if the path is not within a Zarr hierarchy
/// or the image folder is ambiguous.
pub fn open_dropped(resolver: &PathResolver, path: &Path) -> crate::Result<Option<OmeZarrImage>> {
    let Some(info) = resolver.resolve(path) else {
        log::debug!("{} is not within a Zarr hierarchy", path.display());
        return Ok(None);
    };

    let folder = if let Some(folder) = find_multiscales_group(path, &info) {
        folder
    } else if let Some(folder) = &info.image_folder {
        folder.clone()
    } else {
        log::debug!(
            "no unique image folder in {}",
            info.root_folder.display()
        );
        return Ok(None);
    };

    let multiscales = open_multiscales(&folder)?;
    Ok(Some(OmeZarrImage {
        info,
        folder,
        multiscales,
    }))
}
