//! Tests for the process-backed repository handle against real git.

use std::fs;

use pretty_assertions::assert_eq;
use replica_git::{AnnexBackend, AnnexKey, Capabilities, Error, GitRepository};
use replica_test_utils::git::{annex_available, configure_identity, head_oid, resolve};
use replica_test_utils::origin::sha256_hex;
use tempfile::TempDir;

fn new_repo() -> (TempDir, GitRepository) {
    let temp = TempDir::new().unwrap();
    let repo = GitRepository::init(temp.path().join("repo")).unwrap();
    configure_identity(&repo.root().to_native());
    (temp, repo)
}

fn plain_add(repo: &GitRepository, path: &str) {
    replica_test_utils::git::git(&repo.root().to_native(), &["add", "--", path]);
}

#[test]
fn test_open_rejects_plain_directory() {
    let temp = TempDir::new().unwrap();
    let result = GitRepository::open(temp.path());
    assert!(matches!(result, Err(Error::NotARepository { .. })));
}

#[test]
fn test_initial_commit_creates_bookkeeping_folder_once() {
    let (_temp, repo) = new_repo();

    let first = repo.initial_commit().unwrap();
    assert!(first.is_some());
    assert!(repo.path_of(".replica/.gitignore").is_file());

    let second = repo.initial_commit().unwrap();
    assert_eq!(second, None);
    assert_eq!(repo.commit_hash().unwrap(), first.unwrap());
}

#[test]
fn test_ls_tree_lists_only_tracked_paths() {
    let (_temp, repo) = new_repo();
    repo.initial_commit().unwrap();

    fs::create_dir_all(repo.path_of("data").to_native()).unwrap();
    fs::write(repo.path_of("data/a.txt").to_native(), "alpha").unwrap();
    fs::write(repo.path_of("untracked.txt").to_native(), "beta").unwrap();
    plain_add(&repo, "data/a.txt");
    repo.commit("add a").unwrap();

    let paths: Vec<String> = repo.ls_tree().unwrap().into_iter().map(|e| e.path).collect();
    assert_eq!(paths, vec![".replica/.gitignore".to_string(), "data/a.txt".to_string()]);
}

#[test]
fn test_commit_hash_is_short_form_of_head() {
    let (_temp, repo) = new_repo();
    repo.initial_commit().unwrap();

    let short = repo.commit_hash().unwrap();
    let full = head_oid(&repo.root().to_native());
    assert!(full.starts_with(short.as_str()));
    assert!(short.as_str().len() < full.len());
}

#[test]
fn test_checkout_pins_older_commit() {
    let (_temp, repo) = new_repo();
    let first = repo.initial_commit().unwrap().unwrap();

    fs::write(repo.path_of("later.txt").to_native(), "later").unwrap();
    plain_add(&repo, "later.txt");
    repo.commit("later").unwrap();

    repo.checkout(first.as_str()).unwrap();

    let root = repo.root().to_native();
    assert_eq!(head_oid(&root), resolve(&root, first.as_str()));
    assert!(!repo.path_of("later.txt").exists());
}

#[test]
fn test_reset_to_moves_branch() {
    let (_temp, repo) = new_repo();
    let first = repo.initial_commit().unwrap().unwrap();

    fs::write(repo.path_of("later.txt").to_native(), "later").unwrap();
    plain_add(&repo, "later.txt");
    repo.commit("later").unwrap();

    repo.reset_to(&first).unwrap();

    assert!(repo.commit_hash().unwrap().matches(&first));
    // Mixed reset keeps the file in the working tree, now untracked
    let status = repo.status(None, false).unwrap();
    assert!(status.iter().any(|e| e.code == "??" && e.path == "later.txt"));
}

#[test]
fn test_plain_status_reports_modification() {
    let (_temp, repo) = new_repo();
    repo.initial_commit().unwrap();
    fs::write(repo.path_of("a.txt").to_native(), "one").unwrap();
    plain_add(&repo, "a.txt");
    repo.commit("a").unwrap();

    fs::write(repo.path_of("a.txt").to_native(), "two").unwrap();

    let status = repo.status(Some("a.txt"), false).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].code, " M");
}

#[test]
fn test_ignore_is_idempotent() {
    let (_temp, repo) = new_repo();
    repo.initial_commit().unwrap();

    assert!(repo.ignore("scratch.log.tmp").unwrap());
    assert!(!repo.ignore("scratch.log.tmp").unwrap());

    let content = fs::read_to_string(repo.path_of(".gitignore").to_native()).unwrap();
    assert_eq!(content.matches("scratch.log.tmp").count(), 1);
}

#[test]
fn test_delete_if_untracked_never_deletes_tracked_file() {
    let (_temp, repo) = new_repo();
    repo.initial_commit().unwrap();

    fs::write(repo.path_of("kept.txt").to_native(), "kept").unwrap();
    plain_add(&repo, "kept.txt");
    repo.commit("kept").unwrap();
    fs::write(repo.path_of("stray.txt").to_native(), "stray").unwrap();

    assert!(!repo.delete_if_untracked("kept.txt").unwrap());
    assert!(repo.path_of("kept.txt").exists());

    assert!(repo.delete_if_untracked("stray.txt").unwrap());
    assert!(!repo.path_of("stray.txt").exists());

    assert!(!repo.delete_if_untracked("stray.txt").unwrap());
}

#[test]
fn test_annex_init_refuses_to_repin_backend() {
    let (_temp, repo) = new_repo();
    let attributes = repo.path_of(".git/info/attributes").to_native();
    fs::create_dir_all(attributes.parent().unwrap()).unwrap();
    fs::write(&attributes, "* annex.backend=WORM\n").unwrap();

    let result = repo.annex_init(None, Some(AnnexBackend::Sha256E));

    assert!(matches!(result, Err(Error::BackendAlreadyPinned { backend, .. }) if backend == "WORM"));
    assert_eq!(fs::read_to_string(&attributes).unwrap(), "* annex.backend=WORM\n");
}

#[test]
fn test_annex_backend_absent_without_attributes() {
    let (_temp, repo) = new_repo();
    assert_eq!(repo.annex_backend().unwrap(), None);
}

#[test]
fn test_annex_backend_unknown_name_is_typed_error() {
    let (_temp, repo) = new_repo();
    let attributes = repo.path_of(".git/info/attributes").to_native();
    fs::create_dir_all(attributes.parent().unwrap()).unwrap();
    fs::write(&attributes, "* annex.backend=SHA1\n").unwrap();

    assert!(matches!(
        repo.annex_backend(),
        Err(Error::UnsupportedBackend { name }) if name == "SHA1"
    ));
}

#[test]
fn test_annex_add_records_sha256_key() {
    if !annex_available() {
        eprintln!("git-annex not installed, skipping");
        return;
    }
    let (_temp, repo) = new_repo();
    assert!(repo.can_run());
    assert_eq!(Capabilities::detect(), Capabilities { git: true, annex: true });
    assert!(!repo.annex_enabled());
    repo.annex_init(Some("test replica"), Some(AnnexBackend::Sha256E))
        .unwrap();
    assert!(repo.annex_enabled());
    repo.initial_commit().unwrap();
    assert_eq!(repo.annex_backend().unwrap(), Some(AnnexBackend::Sha256E));

    let bytes = vec![7u8; 200 * 1024];
    fs::write(repo.path_of("x.bin").to_native(), &bytes).unwrap();
    repo.add("x.bin").unwrap();
    repo.commit("add x.bin").unwrap();

    let info = repo.annex_info("x.bin").unwrap().expect("x.bin is annexed");
    assert!(info.present);
    let key = AnnexKey::parse(info.key.as_deref().unwrap()).unwrap();
    assert_eq!(key.digest(), sha256_hex(&bytes));
    assert_eq!(key.size, Some(bytes.len() as u64));
}

#[test]
fn test_annex_info_none_for_plain_git_file() {
    if !annex_available() {
        eprintln!("git-annex not installed, skipping");
        return;
    }
    let (_temp, repo) = new_repo();
    repo.annex_init(None, None).unwrap();
    repo.initial_commit().unwrap();

    assert_eq!(repo.annex_info(".replica/.gitignore").unwrap(), None);
}
