//! Errors raised by path, file and config helpers

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document exists but its content does not deserialize.
    #[error("Cannot read {path} as {format}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Cannot write {path} as {format}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// Only `.toml`, `.json`, `.yaml` and `.yml` documents are understood.
    #[error("No document format for extension '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("Could not lock {path} for writing")]
    LockFailed { path: PathBuf },
}

impl Error {
    /// Attach `path` to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
