//! Error types for replica-checksum

use std::path::PathBuf;

/// Result type for checksum operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing checksums
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file to checksum could not be read
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `cksum` ran but printed something other than `<crc> <length> <name>`
    #[error("Unparsable cksum output for {path}: {output:?}")]
    CksumOutput { path: PathBuf, output: String },

    /// Failure of an external command (cksum, git, git-annex)
    #[error(transparent)]
    Command(#[from] replica_git::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
