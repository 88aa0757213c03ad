//! Checksums read out of git-annex keys
//!
//! The generator looks at the backend pinned in the repository's attributes
//! file once, at construction. Without a backend every file gets CRC32. With
//! one, each file's annex key supplies the digest; files whose content is not
//! present, or that annex holds no key for, go through the backend's own
//! algorithm instead.

use replica_git::{AnnexBackend, AnnexKey, GitRepository};

use crate::record::{ChecksumKind, ChecksumRecord, Digest};
use crate::{Error, Result, crc32, hash, worm};

/// Checksum kind reported for keys of `backend`.
pub fn kind_for_backend(backend: AnnexBackend) -> ChecksumKind {
    match backend {
        AnnexBackend::Sha256 | AnnexBackend::Sha256E => ChecksumKind::Sha256,
        AnnexBackend::Md5 | AnnexBackend::Md5E => ChecksumKind::Md5,
        AnnexBackend::Worm => ChecksumKind::Worm,
    }
}

/// Extension-delegated checksum generator.
#[derive(Debug, Clone)]
pub struct AnnexHashGenerator {
    repo: GitRepository,
    backend: Option<AnnexBackend>,
    supplement: ChecksumKind,
}

impl AnnexHashGenerator {
    /// Read the pinned backend of `repo`.
    ///
    /// # Errors
    ///
    /// An unknown backend name in the attributes file is
    /// `replica_git::Error::UnsupportedBackend`, raised here before any file
    /// is touched.
    pub fn new(repo: GitRepository) -> Result<Self> {
        let backend = repo.annex_backend()?;
        let supplement = backend.map(kind_for_backend).unwrap_or(ChecksumKind::Crc32);
        match backend {
            Some(backend) => {
                tracing::debug!(repo = %repo.root(), %backend, "Using git-annex keys as checksums")
            }
            None => tracing::warn!(
                repo = %repo.root(),
                "No git-annex backend configured, using CRC32 for every file"
            ),
        }
        Ok(Self {
            repo,
            backend,
            supplement,
        })
    }

    /// Backend pinned for the repository, if any.
    pub fn backend(&self) -> Option<AnnexBackend> {
        self.backend
    }

    /// Algorithm used for files without a usable key.
    pub fn supplement(&self) -> ChecksumKind {
        self.supplement
    }

    /// Checksum of the repository-relative `relative`.
    pub fn checksum(&self, relative: &str) -> Result<ChecksumRecord> {
        let root = self.repo.root().to_native();
        if self.backend.is_none() {
            return crc32::checksum(&root, relative);
        }

        let info = match self.repo.annex_info(relative)? {
            Some(info) if info.present => info,
            Some(_) => {
                tracing::warn!(path = relative, "Annexed content not present locally, computing checksum");
                return self.supplement_checksum(relative);
            }
            None => return self.supplement_checksum(relative),
        };

        // annex_info only returns records that carry a key
        let key_text = info.key.unwrap_or_default();
        let key = AnnexKey::parse(&key_text)?;

        let path = root.join(relative);
        let metadata = std::fs::metadata(&path).map_err(|e| Error::io(&path, e))?;

        Ok(ChecksumRecord {
            kind: kind_for_backend(key.backend),
            checksum: Digest::Text(key.digest().to_string()),
            file_length: metadata.len(),
            path: relative.to_string(),
        })
    }

    fn supplement_checksum(&self, relative: &str) -> Result<ChecksumRecord> {
        let root = self.repo.root().to_native();
        match self.supplement {
            ChecksumKind::Crc32 => crc32::checksum(&root, relative),
            ChecksumKind::Sha256 => hash::sha256(&root, relative),
            ChecksumKind::Md5 => hash::md5(&root, relative),
            ChecksumKind::Worm => worm::checksum(&root, relative),
        }
    }
}
