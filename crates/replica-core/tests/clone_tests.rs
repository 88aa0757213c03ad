//! End-to-end clone workflow against real git repositories.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use replica_core::{
    CloneOptions, CloneWorkflow, ContentCopy, DatasetKind, DatasetRecord, Error, LocalTransport,
    MemoryRegistry, Registry, RegistryFile, RemoteLocation, Settings, Transport,
};
use replica_test_utils::OriginRepo;
use replica_test_utils::git::{head_oid, resolve};
use replica_test_utils::origin::sha256_hex;
use tempfile::TempDir;

const DATASET: &str = "20240101-1";

/// Local copy that overwrites one file after the bytes arrive.
struct CorruptingTransport {
    path: &'static str,
    calls: Cell<usize>,
}

impl CorruptingTransport {
    fn new(path: &'static str) -> Self {
        Self {
            path,
            calls: Cell::new(0),
        }
    }
}

impl Transport for CorruptingTransport {
    fn copy(&self, source: &RemoteLocation, destination: &Path) -> replica_core::Result<()> {
        self.calls.set(self.calls.get() + 1);
        LocalTransport.copy(source, destination)?;
        fs::write(destination.join(self.path), "corrupted bytes").unwrap();
        Ok(())
    }
}

/// Origin with commit C (`a.txt`, `b.txt`) followed by a later commit
/// that changes `a.txt`.
struct Fixture {
    origin: OriginRepo,
    commit: String,
    workdir: TempDir,
    settings: Settings,
}

impl Fixture {
    fn new() -> Self {
        let origin = OriginRepo::new("data1");
        origin.write("a.txt", "alpha");
        origin.write("b.txt", "beta");
        let commit = origin.commit_all("publish");
        origin.write("a.txt", "alpha, revised");
        origin.commit_all("revise a");

        Self {
            origin,
            commit,
            workdir: TempDir::new().unwrap(),
            settings: Settings {
                user: Some("tester".into()),
                hostname: Some("test-host".into()),
                ..Settings::default()
            },
        }
    }

    fn copy(&self, index: usize) -> ContentCopy {
        ContentCopy {
            index,
            address: "localhost".into(),
            path: self.origin.root().to_string_lossy().into_owned(),
            commit: self.commit.clone(),
            identity: None,
            registered_at: None,
        }
    }

    fn registry(&self, copies: Vec<ContentCopy>) -> MemoryRegistry {
        MemoryRegistry::new().with_dataset(
            DatasetRecord {
                perm_id: DATASET.into(),
                kind: DatasetKind::Link,
                file_list: vec!["a.txt".into(), "b.txt".into()],
                content_copies: copies,
            },
            vec![
                sha_file("a.txt", "alpha"),
                sha_file("b.txt", "beta"),
            ],
        )
    }

    fn workflow<'a>(
        &'a self,
        registry: &'a MemoryRegistry,
        transport: &'a dyn Transport,
    ) -> CloneWorkflow<'a> {
        CloneWorkflow::new(registry, transport, &self.settings, self.workdir.path())
    }
}

fn sha_file(path: &str, content: &str) -> RegistryFile {
    RegistryFile {
        path: path.into(),
        checksum_crc32: None,
        checksum_type: Some("SHA256".into()),
        checksum: Some(sha256_hex(content.as_bytes())),
    }
}

#[test]
fn test_clone_pins_registered_commit() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);

    let outcome = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &CloneOptions::default())
        .unwrap();

    let clone_root = fixture.workdir.path().join("data1");
    assert_eq!(
        head_oid(&clone_root),
        resolve(fixture.origin.root(), &fixture.commit)
    );
    assert_eq!(fs::read_to_string(clone_root.join("a.txt")).unwrap(), "alpha");
    assert_eq!(outcome.source.index, 0);
    assert!(!outcome.removed_source);
}

#[test]
fn test_clone_registers_new_content_copy() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);

    let outcome = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &CloneOptions::default())
        .unwrap();

    let registrations = registry.registrations();
    assert_eq!(registrations.len(), 1);
    let registered = &registrations[0];
    assert_eq!(registered.address, "test-host");
    let expected_path = canonical_string(&fixture.workdir.path().join("data1"));
    assert_eq!(registered.path, expected_path);
    assert!(
        registered.commit.starts_with(&fixture.commit)
            || fixture.commit.starts_with(&registered.commit)
    );
    assert_eq!(
        registered.identity.as_deref(),
        Some(format!("tester@test-host:{expected_path}").as_str())
    );

    let copies = registry.get_dataset(DATASET).unwrap().content_copies;
    assert_eq!(copies.len(), 2);
    assert_eq!(outcome.registered.index, 1);
}

#[test]
fn test_corrupted_file_blocks_registration() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);
    let transport = CorruptingTransport::new("b.txt");

    let result = fixture
        .workflow(&registry, &transport)
        .run(DATASET, &CloneOptions::default());

    assert!(matches!(
        result,
        Err(Error::IntegrityMismatch { files, .. }) if files == vec!["b.txt".to_string()]
    ));
    assert!(registry.registrations().is_empty());
    assert_eq!(registry.get_dataset(DATASET).unwrap().content_copies.len(), 1);
}

#[test]
fn test_skip_integrity_check_registers_anyway() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);
    let transport = CorruptingTransport::new("b.txt");

    let options = CloneOptions {
        skip_integrity_check: true,
        ..CloneOptions::default()
    };
    fixture.workflow(&registry, &transport).run(DATASET, &options).unwrap();

    assert_eq!(registry.search_files_calls(), 0);
    assert_eq!(registry.registrations().len(), 1);
}

#[test]
fn test_ambiguous_selection_has_no_side_effects() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0), fixture.copy(1)]);
    let transport = CorruptingTransport::new("b.txt");

    let result = fixture
        .workflow(&registry, &transport)
        .run(DATASET, &CloneOptions::default());

    assert!(matches!(result, Err(Error::AmbiguousSelection { count: 2, .. })));
    assert_eq!(transport.calls.get(), 0);
    assert_eq!(registry.search_files_calls(), 0);
    assert!(registry.registrations().is_empty());
    assert_eq!(fs::read_dir(fixture.workdir.path()).unwrap().count(), 0);
}

#[test]
fn test_explicit_index_selects_copy() {
    let fixture = Fixture::new();
    let mut unreachable = fixture.copy(0);
    unreachable.path = "/nonexistent/data1".into();
    let registry = fixture.registry(vec![unreachable, fixture.copy(1)]);

    let options = CloneOptions {
        content_copy_index: Some(1),
        ..CloneOptions::default()
    };
    let outcome = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &options)
        .unwrap();

    assert_eq!(outcome.source.index, 1);
}

#[test]
fn test_move_removes_source_copy() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);

    let options = CloneOptions {
        remove_source: true,
        ..CloneOptions::default()
    };
    let outcome = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &options)
        .unwrap();

    assert!(outcome.removed_source);
    assert_eq!(registry.removals(), vec![0]);
    let copies = registry.get_dataset(DATASET).unwrap().content_copies;
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].address, "test-host");
    assert_eq!(outcome.registered.index, 0);
}

#[test]
fn test_occupied_destination_is_refused() {
    let fixture = Fixture::new();
    let registry = fixture.registry(vec![fixture.copy(0)]);
    let destination = fixture.workdir.path().join("data1");
    fs::create_dir_all(&destination).unwrap();
    fs::write(destination.join("keep.txt"), "mine").unwrap();

    let result = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &CloneOptions::default());

    assert!(matches!(result, Err(Error::DestinationExists { .. })));
    assert_eq!(fs::read_to_string(destination.join("keep.txt")).unwrap(), "mine");
    assert!(registry.registrations().is_empty());
}

#[test]
fn test_physical_dataset_is_not_cloned() {
    let fixture = Fixture::new();
    let registry = MemoryRegistry::new().with_dataset(
        DatasetRecord {
            perm_id: DATASET.into(),
            kind: DatasetKind::Physical,
            file_list: vec![],
            content_copies: vec![fixture.copy(0)],
        },
        vec![],
    );

    let result = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &CloneOptions::default());

    assert!(matches!(result, Err(Error::NotALink { .. })));
}

#[test]
fn test_worm_records_survive_local_clone() {
    let fixture = Fixture::new();
    // b.txt is untouched by the later commit, so checkout keeps the copied file
    let stamp = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    fs::File::options()
        .write(true)
        .open(fixture.origin.root().join("b.txt"))
        .unwrap()
        .set_modified(stamp)
        .unwrap();
    let registry = MemoryRegistry::new().with_dataset(
        DatasetRecord {
            perm_id: DATASET.into(),
            kind: DatasetKind::Link,
            file_list: vec!["a.txt".into(), "b.txt".into()],
            content_copies: vec![fixture.copy(0)],
        },
        vec![
            sha_file("a.txt", "alpha"),
            RegistryFile {
                path: "b.txt".into(),
                checksum_crc32: None,
                checksum_type: Some("WORM".into()),
                checksum: Some("s4-m1600000000--b.txt".into()),
            },
        ],
    );

    let outcome = fixture
        .workflow(&registry, &LocalTransport)
        .run(DATASET, &CloneOptions::default())
        .unwrap();

    assert_eq!(registry.search_files_calls(), 1);
    assert_eq!(registry.registrations().len(), 1);
    assert_eq!(outcome.registered.index, 1);
}

fn canonical_string(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/")
}
