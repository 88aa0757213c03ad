//! Integrity verification against registry checksum records.

use std::fs;

use pretty_assertions::assert_eq;
use replica_checksum::{ChecksumGenerator, Digest};
use replica_core::{
    DatasetKind, DatasetRecord, Error, MemoryRegistry, RegistryFile, validate_checksum,
};
use replica_test_utils::origin::sha256_hex;
use tempfile::TempDir;

const DATASET: &str = "20240101-1";

fn folder(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

fn sha_record(path: &str, content: &str) -> RegistryFile {
    RegistryFile {
        path: path.into(),
        checksum_crc32: None,
        checksum_type: Some("SHA256".into()),
        checksum: Some(sha256_hex(content.as_bytes())),
    }
}

fn crc_of(dir: &TempDir, path: &str) -> u32 {
    let record = ChecksumGenerator::Crc32.checksum(dir.path(), path).unwrap();
    match record.checksum {
        Digest::Crc32(value) => value,
        other => panic!("expected a CRC32, got {other}"),
    }
}

fn registry(files: Vec<RegistryFile>) -> MemoryRegistry {
    let file_list = files.iter().map(|f| f.path.clone()).collect();
    MemoryRegistry::new().with_dataset(
        DatasetRecord {
            perm_id: DATASET.into(),
            kind: DatasetKind::Link,
            file_list,
            content_copies: vec![],
        },
        files,
    )
}

fn paths(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_only_mismatching_file_is_reported() {
    let dir = folder(&[("a.txt", "alpha"), ("b.txt", "beta"), ("c.txt", "tampered")]);
    let registry = registry(vec![
        sha_record("a.txt", "alpha"),
        sha_record("b.txt", "beta"),
        sha_record("c.txt", "gamma"),
    ]);

    let invalid =
        validate_checksum(&registry, &paths(&["a.txt", "b.txt", "c.txt"]), DATASET, dir.path())
            .unwrap();

    assert_eq!(invalid, vec!["c.txt".to_string()]);
    assert_eq!(registry.search_files_calls(), 1);
}

#[test]
fn test_verification_is_repeatable() {
    let dir = folder(&[("a.txt", "alpha"), ("c.txt", "tampered")]);
    let registry = registry(vec![sha_record("a.txt", "alpha"), sha_record("c.txt", "gamma")]);
    let files = paths(&["a.txt", "c.txt"]);

    let first = validate_checksum(&registry, &files, DATASET, dir.path()).unwrap();
    let second = validate_checksum(&registry, &files, DATASET, dir.path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_nonzero_crc32_takes_precedence() {
    let dir = folder(&[("a.txt", "alpha")]);
    let crc = crc_of(&dir, "a.txt");

    // Correct CRC32, wrong typed checksum: passes
    let passing = registry(vec![RegistryFile {
        path: "a.txt".into(),
        checksum_crc32: Some(crc),
        checksum_type: Some("SHA256".into()),
        checksum: Some(sha256_hex(b"something else")),
    }]);
    assert!(
        validate_checksum(&passing, &paths(&["a.txt"]), DATASET, dir.path())
            .unwrap()
            .is_empty()
    );

    // Wrong CRC32, correct typed checksum: fails
    let failing = registry(vec![RegistryFile {
        path: "a.txt".into(),
        checksum_crc32: Some(crc.wrapping_add(1).max(1)),
        checksum_type: Some("SHA256".into()),
        checksum: Some(sha256_hex(b"alpha")),
    }]);
    assert_eq!(
        validate_checksum(&failing, &paths(&["a.txt"]), DATASET, dir.path()).unwrap(),
        vec!["a.txt".to_string()]
    );
}

#[test]
fn test_zero_crc32_falls_through_to_typed_checksum() {
    let dir = folder(&[("a.txt", "alpha")]);
    let registry = registry(vec![RegistryFile {
        path: "a.txt".into(),
        checksum_crc32: Some(0),
        checksum_type: Some("SHA256".into()),
        checksum: Some(sha256_hex(b"not alpha")),
    }]);

    assert_eq!(
        validate_checksum(&registry, &paths(&["a.txt"]), DATASET, dir.path()).unwrap(),
        vec!["a.txt".to_string()]
    );
}

#[test]
fn test_record_without_checksum_is_skipped() {
    let dir = folder(&[("notes.txt", "anything")]);
    let registry = registry(vec![
        RegistryFile {
            path: "notes.txt".into(),
            checksum_crc32: None,
            checksum_type: None,
            checksum: None,
        },
    ]);

    assert!(
        validate_checksum(&registry, &paths(&["notes.txt"]), DATASET, dir.path())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_unknown_checksum_type_is_skipped() {
    let dir = folder(&[("a.txt", "alpha")]);
    let registry = registry(vec![RegistryFile {
        path: "a.txt".into(),
        checksum_crc32: None,
        checksum_type: Some("BLAKE3".into()),
        checksum: Some("ffff".into()),
    }]);

    assert!(
        validate_checksum(&registry, &paths(&["a.txt"]), DATASET, dir.path())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_md5_typed_checksum() {
    let dir = folder(&[("a.txt", "foo")]);
    let registry = registry(vec![RegistryFile {
        path: "a.txt".into(),
        checksum_crc32: None,
        checksum_type: Some("MD5".into()),
        checksum: Some("acbd18db4cc2f85cedef654fccc4a4d8".into()),
    }]);

    assert!(
        validate_checksum(&registry, &paths(&["a.txt"]), DATASET, dir.path())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_path_without_registry_record_is_error() {
    let dir = folder(&[("a.txt", "alpha"), ("extra.txt", "x")]);
    let registry = registry(vec![sha_record("a.txt", "alpha")]);

    let result = validate_checksum(&registry, &paths(&["a.txt", "extra.txt"]), DATASET, dir.path());

    assert!(matches!(
        result,
        Err(Error::FileNotRecorded { path, .. }) if path == "extra.txt"
    ));
}

#[test]
fn test_missing_local_file_is_error() {
    let dir = folder(&[]);
    let registry = registry(vec![sha_record("a.txt", "alpha")]);

    let result = validate_checksum(&registry, &paths(&["a.txt"]), DATASET, dir.path());

    assert!(matches!(result, Err(Error::Checksum(_))));
}

#[test]
fn test_unknown_dataset_is_error() {
    let dir = folder(&[]);
    let registry = registry(vec![]);

    let result = validate_checksum(&registry, &[], "missing", dir.path());

    assert!(matches!(result, Err(Error::DatasetNotFound { .. })));
}
