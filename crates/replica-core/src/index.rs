//! Per-file content index of a repository
//!
//! The index lists every path tracked at HEAD together with a freshly
//! computed checksum. Checksums are produced on demand while iterating, so
//! a large dataset never holds more than one record at a time.

use replica_checksum::{AnnexHashGenerator, ChecksumGenerator, ChecksumRecord};
use replica_git::{GitRepository, ObjectKind, TreeEntry};
use serde::Serialize;

use crate::Result;

/// Which layer holds a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedBy {
    Git,
    /// Recorded as a symlink into the annex object store
    Annex,
}

/// One entry of the content index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    /// Same as `checksum.path`
    #[serde(skip)]
    pub path: String,
    pub tracked_by: TrackedBy,
    #[serde(flatten)]
    pub checksum: ChecksumRecord,
}

/// Content index over one repository.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    repo: GitRepository,
    generator: ChecksumGenerator,
}

impl ContentIndex {
    /// Build an index for `repo`.
    ///
    /// With `use_annex_hash` the checksums come from git-annex keys; the
    /// pinned backend is validated here, before any file is read. Otherwise
    /// every file gets a CRC32.
    pub fn new(repo: &GitRepository, use_annex_hash: bool) -> Result<Self> {
        let generator = if use_annex_hash {
            ChecksumGenerator::Delegated(AnnexHashGenerator::new(repo.clone())?)
        } else {
            ChecksumGenerator::Crc32
        };
        Ok(Self {
            repo: repo.clone(),
            generator,
        })
    }

    /// Iterate over every tracked file at HEAD.
    ///
    /// The path listing is taken once; checksums are computed as items are
    /// pulled. Calling `files` again starts a fresh pass.
    pub fn files(&self) -> Result<impl Iterator<Item = Result<RepositoryFile>> + '_> {
        let root = self.repo.root().to_native();
        let entries = self.repo.ls_tree()?;
        tracing::debug!(repo = %self.repo.root(), files = entries.len(), "Listed tracked files");

        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind == ObjectKind::Blob)
            .map(move |entry| self.describe(&root, entry)))
    }

    fn describe(&self, root: &std::path::Path, entry: TreeEntry) -> Result<RepositoryFile> {
        let tracked_by = if entry.is_symlink() {
            TrackedBy::Annex
        } else {
            TrackedBy::Git
        };
        let checksum = self.generator.checksum(root, &entry.path)?;
        Ok(RepositoryFile {
            path: entry.path,
            tracked_by,
            checksum,
        })
    }
}
