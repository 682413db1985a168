use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::sync::Arc;

use realfs::{Attributes, Bridge, BridgeConfig, Directory, Entry, Error, Field};
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<Bridge>, Directory) {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("a.txt"), b"alpha").unwrap();
    fs::create_dir(tmp.path().join("sub")).unwrap();
    let bridge = Bridge::new(&BridgeConfig::default());
    let root = bridge.open_directory(tmp.path());
    (tmp, bridge, root)
}

#[test]
fn test_add_file_links_only_the_file() {
    let (tmp, bridge, mut root) = setup();
    let file = Entry::File(bridge.open_file(tmp.path().join("a.txt")));
    assert_eq!(file.links(), 0);

    let added = root.add_item("a.txt", file).unwrap();
    assert!(added.is_file());
    assert_eq!(added.links(), 1);
    assert_eq!(root.links(), 0);
}

#[test]
fn test_add_directory_links_child_twice_and_parent_once() {
    let (tmp, bridge, mut root) = setup();
    let sub = Entry::Directory(bridge.open_directory(tmp.path().join("sub")));

    let added = root.add_item("sub", sub).unwrap();
    assert!(added.is_dir());
    assert_eq!(added.links(), 2);
    assert_eq!(root.links(), 1);
}

#[test]
fn test_add_then_remove_restores_links() {
    let (tmp, bridge, mut root) = setup();
    let mut parent = bridge.open_directory(tmp.path());
    parent
        .add_item("root", Entry::Directory(root.clone()))
        .unwrap();
    let root_before = parent.child("root").unwrap().links();
    assert_eq!(root_before, 2);

    let sub = parent.directory_mut("root").unwrap();
    sub.add_item(
        "sub",
        Entry::Directory(bridge.open_directory(tmp.path().join("sub"))),
    )
    .unwrap();
    sub.add_item("a.txt", Entry::File(bridge.open_file(tmp.path().join("a.txt"))))
        .unwrap();
    assert_eq!(sub.links(), root_before + 1);

    let removed_dir = sub.remove_item("sub").unwrap();
    let removed_file = sub.remove_item("a.txt").unwrap();
    assert_eq!(sub.links(), root_before);
    assert_eq!(removed_dir.links(), 0);
    assert_eq!(removed_file.links(), 0);

    root.add_item("a.txt", removed_file).unwrap();
    assert_eq!(root.child("a.txt").unwrap().links(), 1);
}

#[test]
fn test_duplicate_name_is_rejected() {
    let (tmp, bridge, mut root) = setup();
    root.add_item("x", Entry::File(bridge.open_file(tmp.path().join("a.txt"))))
        .unwrap();

    let second = Entry::Directory(bridge.open_directory(tmp.path().join("sub")));
    match root.add_item("x", second) {
        Err(Error::AlreadyExists(name)) => assert_eq!(name, "x"),
        other => panic!("expected AlreadyExists, got {:?}", other.map(|e| e.to_string())),
    }

    assert_eq!(root.children().count(), 1);
    let kept = root.child("x").unwrap();
    assert!(kept.is_file());
    assert_eq!(kept.links(), 1);
    assert_eq!(root.links(), 0);
}

#[test]
fn test_remove_missing_is_not_found() {
    let (_tmp, _bridge, mut root) = setup();
    match root.remove_item("missing") {
        Err(Error::NotFound(name)) => assert_eq!(name, "missing"),
        other => panic!("expected NotFound, got {:?}", other.map(|e| e.to_string())),
    }
}

#[test]
fn test_structural_change_touches_mtime() {
    let (tmp, bridge, mut root) = setup();
    assert!(root.item().overrides().mtime.is_none());
    let before = chrono::Utc::now();
    root.add_item("a.txt", Entry::File(bridge.open_file(tmp.path().join("a.txt"))))
        .unwrap();
    let touched = root.item().overrides().mtime.unwrap();
    assert!(touched >= before);
    assert_eq!(root.mtime().unwrap(), touched);
}

#[test]
fn test_get_item_classifies_backing_store() {
    let (_tmp, _bridge, root) = setup();

    let file = root.get_item("a.txt").unwrap().unwrap();
    assert!(matches!(file, Cow::Owned(Entry::File(_))));
    assert_eq!(file.links(), 0);
    assert_eq!(file.as_file().unwrap().content().unwrap(), b"alpha");

    let sub = root.get_item("sub").unwrap().unwrap();
    assert!(sub.is_dir());
    assert_eq!(sub.to_string(), "[Directory]");
}

#[test]
fn test_get_item_prefers_attached_children() {
    let (tmp, bridge, mut root) = setup();
    root.add_item("sub", Entry::Directory(bridge.open_directory(tmp.path().join("sub"))))
        .unwrap();

    let sub = root.get_item("sub").unwrap().unwrap();
    assert!(matches!(sub, Cow::Borrowed(_)));
    assert_eq!(sub.links(), 2);
    let record = sub.metadata_record(true).unwrap();
    assert_eq!(record.get_i64(Field::Nlink), 2);
}

#[test]
fn test_unattached_parent_keeps_backing_nlink() {
    let (tmp, bridge, mut root) = setup();
    let backing = fs::metadata(tmp.path()).unwrap().nlink();
    root.add_item("sub", Entry::Directory(bridge.open_directory(tmp.path().join("sub"))))
        .unwrap();
    assert_eq!(root.links(), 1);
    assert_eq!(root.item().attached(), 0);

    for wide in [false, true] {
        let record = root.metadata_record(wide).unwrap();
        assert_eq!(record.get_i64(Field::Nlink), backing as i64);
        assert_eq!(record.get(Field::Nlink), backing as f64);
    }
}

#[test]
fn test_attached_directory_counts_nested_directories() {
    let (tmp, bridge, mut root) = setup();
    fs::create_dir(tmp.path().join("sub").join("inner")).unwrap();
    root.add_item("sub", Entry::Directory(bridge.open_directory(tmp.path().join("sub"))))
        .unwrap();
    let sub = root.directory_mut("sub").unwrap();
    sub.add_item(
        "inner",
        Entry::Directory(bridge.open_directory(tmp.path().join("sub").join("inner"))),
    )
    .unwrap();
    assert_eq!(sub.links(), 3);

    for wide in [false, true] {
        let record = sub.metadata_record(wide).unwrap();
        assert_eq!(record.get_i64(Field::Nlink), 3);
        assert_eq!(record.get(Field::Nlink), 3.0);
    }
}

#[test]
fn test_swapped_file_is_not_detached() {
    let (tmp, bridge, mut root) = setup();
    root.add_item("x", Entry::File(bridge.open_file(tmp.path().join("a.txt"))))
        .unwrap();
    *root.file_mut("x").unwrap() = bridge.open_file(tmp.path().join("a.txt"));

    match root.remove_item("x") {
        Err(Error::LinkCountMismatch(name)) => assert_eq!(name, "x"),
        other => panic!("expected LinkCountMismatch, got {:?}", other.map(|e| e.to_string())),
    }
    let kept = root.child("x").unwrap();
    assert!(kept.is_file());
    assert_eq!(kept.links(), 0);
    assert_eq!(root.links(), 0);
}

#[test]
fn test_swapped_directory_is_not_detached() {
    let (tmp, bridge, mut root) = setup();
    root.add_item("sub", Entry::Directory(bridge.open_directory(tmp.path().join("sub"))))
        .unwrap();
    *root.directory_mut("sub").unwrap() = bridge.open_directory(tmp.path().join("sub"));

    assert!(matches!(root.remove_item("sub"), Err(Error::LinkCountMismatch(_))));
    assert!(root.child("sub").unwrap().is_dir());
    assert_eq!(root.links(), 1);
    assert!(root.file_mut("sub").is_none());
}

#[test]
fn test_get_item_absent_is_none() {
    let (tmp, bridge, root) = setup();
    assert!(root.get_item("missing").unwrap().is_none());

    // A lookup beneath a regular file finds nothing rather than failing.
    let not_a_dir = bridge.open_directory(tmp.path().join("a.txt"));
    assert!(not_a_dir.get_item("child").unwrap().is_none());
}

#[test]
fn test_get_item_rejects_path_names() {
    let (_tmp, _bridge, root) = setup();
    assert!(matches!(root.get_item("sub/a.txt"), Err(Error::InvalidArgument(_))));
    assert!(matches!(root.get_item(".."), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_get_item_inaccessible_is_an_error() {
    if unsafe { libc::geteuid() } == 0 {
        // The superuser is never denied by the host.
        return;
    }
    let (tmp, bridge, _root) = setup();
    let locked = tmp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner"), b"x").unwrap();
    let mut dir = bridge.open_directory(&locked);
    dir.set_mode(0o000).unwrap();

    let result = dir.get_item("inner").map(|o| o.map(|c| c.into_owned()));
    dir.set_mode(0o755).unwrap();
    match result {
        Err(err) => assert!(!err.is_absent()),
        Ok(found) => panic!("expected an I/O error, got {:?}", found.map(|e| e.to_string())),
    }
}

#[test]
fn test_list_reads_backing_directory() {
    let (tmp, bridge, mut root) = setup();
    let mut names = root.list().unwrap();
    names.sort();
    assert_eq!(names, vec![OsString::from("a.txt"), OsString::from("sub")]);

    // Attaching does not create anything on disk.
    root.add_item("phantom", Entry::File(bridge.open_file(tmp.path().join("a.txt"))))
        .unwrap();
    assert_eq!(root.list().unwrap().len(), 2);

    let missing = bridge.open_directory(tmp.path().join("missing"));
    assert!(missing.list().unwrap_err().is_absent());
}
