use std::fs;
use std::path::{Path, PathBuf};

use zarrs_ngff::Error;
use zarrs_ngff::path::{
    PathResolver, find_highest_resolution_by_name, find_image_root_folder, find_root_folder,
    is_zarr_folder, relative_path_elements,
};

fn data_dir() -> PathBuf {
    env_logger::try_init().ok();
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

const EXAMPLES: [&str; 2] = ["ome_zarr_v4_example", "ome_zarr_v5_example"];

/// Create a folder which is a Zarr v2 group.
fn zarr_group(path: &Path) {
    fs::create_dir_all(path).expect("create folder");
    fs::write(path.join(".zgroup"), r#"{"zarr_format":2}"#).expect("write .zgroup");
}

#[test]
fn test_is_zarr_folder() {
    let data = data_dir();
    for example in EXAMPLES {
        let root = data.join(example);
        assert!(is_zarr_folder(&root));
        assert!(is_zarr_folder(&root.join("scale0")));
        assert!(is_zarr_folder(&root.join("scale0/image")));
    }
    assert!(!is_zarr_folder(&data));
    assert!(!is_zarr_folder(&data.join("ome_zarr_v4_example/scale0/image/0")));
    assert!(!is_zarr_folder(&data.join("ome_zarr_v5_example/scale0/image/c/0")));
    assert!(!is_zarr_folder(&data.join("does_not_exist")));
}

#[test]
fn test_zattrs_alone_is_a_marker() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join(".zattrs"), "{}").unwrap();
    assert!(is_zarr_folder(tmp.path()));
}

#[test]
fn test_find_root_folder() {
    let data = data_dir();
    for example in EXAMPLES {
        let root = data.join(example);
        for start in [root.clone(), root.join("scale0"), root.join("scale0/image")] {
            assert_eq!(find_root_folder(&start), Some(root.clone()));
        }
    }
}

#[test]
fn test_find_root_folder_outside_zarr() {
    let data = data_dir();
    assert_eq!(find_root_folder(&data), None);
    assert_eq!(
        find_root_folder(&data.join("ome_zarr_v4_example/scale0/image/0")),
        None
    );
}

#[test]
fn test_find_root_folder_idempotent() {
    let start = data_dir().join("ome_zarr_v5_example/scale0/image");
    let root = find_root_folder(&start).expect("inside a hierarchy");
    assert_eq!(find_root_folder(&root), Some(root));
}

#[test]
fn test_find_root_folder_nested_zarr() {
    let tmp = tempfile::TempDir::new().unwrap();
    let outer = tmp.path().join("outer.zarr");
    let inner = outer.join("labels/inner.zarr");
    zarr_group(&outer);
    zarr_group(&outer.join("labels"));
    zarr_group(&inner);
    assert_eq!(find_root_folder(&inner), Some(outer));
}

#[test]
fn test_find_image_root_folder_start_on_root() {
    let data = data_dir();
    for example in EXAMPLES {
        // scale0 and scale1 are both candidates
        assert_eq!(find_image_root_folder(&data.join(example)), None);
    }
}

#[test]
fn test_find_image_root_folder_start_below_root() {
    let data = data_dir();
    for example in EXAMPLES {
        let expected = data.join(example).join("scale0");
        assert_eq!(find_image_root_folder(&expected), Some(expected.clone()));
        assert_eq!(
            find_image_root_folder(&expected.join("image")),
            Some(expected.clone())
        );
    }
}

#[test]
fn test_find_image_root_folder_single_subfolder() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("single.zarr");
    zarr_group(&root);
    zarr_group(&root.join("0"));
    fs::create_dir(root.join("OME")).unwrap();
    fs::write(root.join("notes.txt"), "not a folder").unwrap();

    assert_eq!(find_image_root_folder(&root), Some(root.join("0")));
}

#[test]
fn test_find_image_root_folder_no_subfolder() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("empty.zarr");
    zarr_group(&root);
    fs::create_dir(root.join("OME")).unwrap();

    assert_eq!(find_image_root_folder(&root), None);
}

#[test]
fn test_find_image_root_folder_outside_zarr() {
    assert_eq!(find_image_root_folder(&data_dir()), None);
}

#[test]
fn test_configured_ignored_subfolders() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("labelled.zarr");
    zarr_group(&root);
    zarr_group(&root.join("image"));
    zarr_group(&root.join("labels"));

    assert_eq!(find_image_root_folder(&root), None);

    let resolver = PathResolver::new().with_ignored_subfolder("labels");
    assert_eq!(
        resolver.find_image_root_folder(&root),
        Some(root.join("image"))
    );
}

#[test]
fn test_configured_markers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("custom");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("attributes.json"), "{}").unwrap();

    assert!(!is_zarr_folder(&root));
    let resolver = PathResolver::new().with_marker("attributes.json");
    assert!(resolver.is_zarr_folder(&root));
}

#[test]
fn test_resolver_from_config() {
    let resolver: PathResolver = serde_json::from_str("{}").unwrap();
    assert_eq!(resolver, PathResolver::default());

    let resolver: PathResolver =
        serde_json::from_str(r#"{"ignoredSubfolders": ["OME", "labels"]}"#).unwrap();
    assert_eq!(resolver.markers, PathResolver::default().markers);
    assert_eq!(resolver.ignored_subfolders, ["OME", "labels"]);
}

#[test]
fn test_relative_path_elements() {
    let ancestor = Path::new("/root/folderA");
    let descendant = Path::new("/root/folderA/sub/image");
    let elements = relative_path_elements(ancestor, descendant).unwrap();
    assert_eq!(elements, ["sub", "image"]);

    let rebuilt = elements
        .iter()
        .fold(ancestor.to_path_buf(), |path, name| path.join(name));
    assert_eq!(rebuilt, descendant);
}

#[test]
fn test_relative_path_elements_equal() {
    for p in ["/root/folderA", "relative/folder", "/"] {
        let p = Path::new(p);
        assert!(relative_path_elements(p, p).unwrap().is_empty());
    }
}

#[test]
fn test_relative_path_elements_not_descendant() {
    let cases = [
        ("/root/folderA", "/differentRoot/folderB"),
        ("/root/folderA", "/root/folderAB/c"),
        ("/root/folderA/sub", "/root/folderA"),
    ];
    for (ancestor, descendant) in cases {
        let result = relative_path_elements(Path::new(ancestor), Path::new(descendant));
        assert!(
            matches!(result, Err(Error::NotADescendant { .. })),
            "{ancestor} -> {descendant}: {result:?}"
        );
    }
}

#[test]
fn test_find_highest_resolution_by_name() {
    assert_eq!(
        find_highest_resolution_by_name(&["2", "0", "s0", "1"]),
        Some("s0")
    );
    assert_eq!(find_highest_resolution_by_name(&["a", "b"]), Some("a"));
    assert_eq!(
        find_highest_resolution_by_name(&["raw/s1".to_owned(), "raw/s0".to_owned()]),
        Some("raw/s0")
    );
    assert_eq!(find_highest_resolution_by_name::<&str>(&[]), None);
}

#[test]
fn test_resolve() {
    let root = data_dir().join("ome_zarr_v4_example");
    let info = PathResolver::default()
        .resolve(&root.join("scale0/image"))
        .expect("inside a hierarchy");
    assert_eq!(info.root_folder, root);
    assert_eq!(info.image_folder, Some(root.join("scale0")));
    assert_eq!(info.relative_segments, ["scale0", "image"]);

    let info = PathResolver::default().resolve(&root).unwrap();
    assert_eq!(info.image_folder, None);
    assert!(info.relative_segments.is_empty());

    assert_eq!(PathResolver::default().resolve(&data_dir()), None);
}
