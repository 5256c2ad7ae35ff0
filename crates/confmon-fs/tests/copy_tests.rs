use assert_fs::prelude::*;
use confmon_fs::{compute_content_checksum, compute_file_checksum, io};
use predicates::prelude::*;

#[test]
fn test_copy_file_creates_destination_dirs() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("rules/group-a.yml");
    source.write_str("groups: []\n").unwrap();
    let backup = temp.child("rules/.backup/group-a.20240101-000000.yml");

    io::copy_file(source.path(), backup.path()).unwrap();

    backup.assert("groups: []\n");
    source.assert(predicate::path::exists());
}

#[test]
fn test_copy_missing_source_names_path() {
    let temp = assert_fs::TempDir::new().unwrap();
    let missing = temp.child("absent.yml");

    let err = io::copy_file(missing.path(), temp.child("copy.yml").path()).unwrap_err();

    assert!(err.to_string().contains("absent.yml"), "got: {}", err);
    temp.child("copy.yml").assert(predicate::path::missing());
}

#[test]
fn test_file_checksum_matches_content_checksum() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("check.sh");
    file.write_str("check_disk /\n").unwrap();

    assert_eq!(
        compute_file_checksum(file.path()).unwrap(),
        compute_content_checksum("check_disk /\n")
    );
}

#[test]
fn test_remove_then_write_leaves_only_new_content() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("group-b.yml");
    file.write_str("old").unwrap();

    assert!(io::remove_if_exists(file.path()).unwrap());
    file.assert(predicate::path::missing());

    io::write_text(file.path(), "new").unwrap();
    file.assert(predicate::str::diff("new"));
}
