//! [`OriginRepo`] builder: a published replica with a commit history.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use crate::git::{git, real_git_repo};

/// A plain-git repository under a temporary directory, standing in for the
/// remote replica a content copy points at.
///
/// # Example
///
/// ```rust,no_run
/// use replica_test_utils::OriginRepo;
///
/// let origin = OriginRepo::new("data1");
/// origin.write("a.txt", "alpha");
/// let commit = origin.commit_all("add a");
/// assert!(!commit.is_empty());
/// ```
pub struct OriginRepo {
    temp_dir: TempDir,
    root: PathBuf,
}

impl OriginRepo {
    /// Create `<tmp>/<name>` as an empty git repository.
    pub fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(name);
        real_git_repo(&root);
        Self { temp_dir, root }
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent temporary directory.
    pub fn parent(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to the repository-relative `path`.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    /// Stage everything and commit; returns the abbreviated commit id.
    pub fn commit_all(&self, message: &str) -> String {
        git(&self.root, &["add", "-A"]);
        git(&self.root, &["commit", "-m", message]);
        git(&self.root, &["rev-parse", "--short", "HEAD"])
    }
}

/// Lowercase hex SHA-256 of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}
