//! Command-level errors

pub type Result<T> = std::result::Result<T, CliError>;

/// Anything a subcommand can fail with; `main` prints it and exits 1.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] replica_core::Error),

    #[error(transparent)]
    Git(#[from] replica_git::Error),

    #[error(transparent)]
    Fs(#[from] replica_fs::Error),

    /// Writing to stdout failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invocation problem the user can fix, printed as-is
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
