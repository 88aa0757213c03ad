//! Git repository fixtures.

use std::path::Path;
use std::process::Command;

/// Run `git` with `args` inside `path`, panicking on failure.
///
/// Returns trimmed stdout.
///
/// # Panics
/// Panics if git cannot be launched or exits unsuccessfully.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "git: `git {args:?}` failed in {}:\n{}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Set a local committer identity so commits work on bare CI machines.
pub fn configure_identity(path: &Path) {
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
}

/// Initialise a real git repository with an identity and no commits.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo(path: &Path) {
    std::fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("real_git_repo: failed to create {}: {e}", path.display()));
    git(path, &["init"]);
    configure_identity(path);
}

/// Open the repository at `path` with `git2` and return HEAD's full id.
///
/// # Panics
/// Panics if the repository or HEAD cannot be resolved.
pub fn head_oid(path: &Path) -> String {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("head_oid: cannot open {}: {e}", path.display()));
    let head = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .unwrap_or_else(|e| panic!("head_oid: cannot resolve HEAD: {e}"));
    head.id().to_string()
}

/// Resolve an abbreviated revision to its full id with `git2`.
///
/// # Panics
/// Panics if the revision does not resolve.
pub fn resolve(path: &Path, rev: &str) -> String {
    let repo = git2::Repository::open(path)
        .unwrap_or_else(|e| panic!("resolve: cannot open {}: {e}", path.display()));
    repo.revparse_single(rev)
        .unwrap_or_else(|e| panic!("resolve: cannot resolve {rev}: {e}"))
        .id()
        .to_string()
}

/// Whether `git annex` is installed.
///
/// Tests that exercise git-annex return early when this is false.
pub fn annex_available() -> bool {
    Command::new("git")
        .args(["annex", "version"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
