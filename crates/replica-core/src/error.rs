//! Error types for replica-core

use std::path::PathBuf;

/// Result type for replica-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in replica-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Recomputed checksums differ from the registry for these files
    #[error("Invalid checksum for files {files:?} of data set {dataset}")]
    IntegrityMismatch { dataset: String, files: Vec<String> },

    /// Several content copies exist and none was chosen
    #[error("Data set {dataset} has {count} content copies; choose one with an index")]
    AmbiguousSelection { dataset: String, count: usize },

    #[error("Data set {dataset} has no content copies")]
    NoContentCopies { dataset: String },

    #[error("Content copy index {index} out of range for data set {dataset} ({count} copies)")]
    ContentCopyIndexOutOfRange {
        dataset: String,
        index: usize,
        count: usize,
    },

    #[error("Data set {dataset} is of kind {kind} but should be LINK")]
    NotALink { dataset: String, kind: String },

    #[error("Data set not found: {dataset}")]
    DatasetNotFound { dataset: String },

    /// A requested path has no file record in the registry
    #[error("File {path} is not recorded for data set {dataset}")]
    FileNotRecorded { dataset: String, path: String },

    #[error("Invalid content copy: {message}")]
    InvalidContentCopy { message: String },

    #[error("Destination {path} already exists and is not empty")]
    DestinationExists { path: PathBuf },

    #[error("Content copy {path} at {host} is already registered for data set {dataset} at commit {commit}")]
    AlreadyRegistered {
        dataset: String,
        host: String,
        path: String,
        commit: String,
    },

    #[error("No content copy of data set {dataset} points at {host}:{path}")]
    ReplicaNotRegistered {
        dataset: String,
        host: String,
        path: String,
    },

    /// Copying replica bytes failed
    #[error("Transport failed for {location}: {source}")]
    Transport {
        location: String,
        #[source]
        source: replica_git::Error,
    },

    /// The registry refused or could not serve a request
    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("Unknown setting '{key}'")]
    UnknownSetting { key: String },

    #[error("Invalid value '{value}' for setting {key}: {message}")]
    InvalidSetting {
        key: String,
        value: String,
        message: String,
    },

    #[error("No user configuration directory on this system")]
    NoConfigDirectory,

    // Transparent wrappers for underlying crate errors
    /// Checksum error from replica-checksum
    #[error(transparent)]
    Checksum(#[from] replica_checksum::Error),

    /// Repository backend error from replica-git
    #[error(transparent)]
    Git(#[from] replica_git::Error),

    /// Filesystem error from replica-fs
    #[error(transparent)]
    Fs(#[from] replica_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error names a git-annex backend without a digest rule.
    pub fn is_unsupported_backend(&self) -> bool {
        matches!(
            self,
            Self::Git(replica_git::Error::UnsupportedBackend { .. })
                | Self::Checksum(replica_checksum::Error::Command(
                    replica_git::Error::UnsupportedBackend { .. }
                ))
        )
    }
}
