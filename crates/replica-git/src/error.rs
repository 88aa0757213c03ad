//! Error types for replica-git

use std::path::PathBuf;

/// Result type for replica-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in replica-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The process could not be launched at all (missing binary, bad cwd)
    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("Command `{command}` failed (exit code: {status:?}): {}", .stderr.trim())]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The process succeeded but its output did not decode
    #[error("Could not decode output of {operation}: {message} (output: {output:?})")]
    Decode {
        operation: &'static str,
        message: String,
        output: String,
    },

    #[error("Unsupported git-annex backend: {name}")]
    UnsupportedBackend { name: String },

    #[error("Malformed git-annex key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("git-annex backend already pinned to {backend} in {path}")]
    BackendAlreadyPinned { backend: String, path: PathBuf },

    /// The tool is missing or did not answer
    #[error("`{tool}` is not available; install it and make sure it is on PATH")]
    ToolUnavailable { tool: &'static str },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("Filesystem error: {0}")]
    Fs(#[from] replica_fs::Error),
}

impl Error {
    pub(crate) fn decode(
        operation: &'static str,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
            output: output.into(),
        }
    }
}
