//! Command implementations for replica-cli

pub mod clone;
pub mod config;
pub mod init;
pub mod manifest;
pub mod publish;
pub mod refs;
pub mod verify;

pub use clone::run_clone;
pub use config::run_config;
pub use init::run_init;
pub use manifest::run_manifest;
pub use publish::{run_commit, run_status, run_sync};
pub use refs::{run_addref, run_removeref};
pub use verify::run_verify;

use std::path::Path;

use replica_core::{FileRegistry, Settings};

use crate::error::{CliError, Result};

/// Open the registry named on the command line, or the configured one.
pub(crate) fn open_registry(flag: Option<&Path>, settings: &Settings) -> Result<FileRegistry> {
    let path = flag
        .map(Path::to_path_buf)
        .or_else(|| settings.registry.clone())
        .ok_or_else(|| {
            CliError::user(
                "No registry configured. Pass --registry, set REPLICA_REGISTRY, or add `registry` to the config file.",
            )
        })?;
    tracing::debug!(registry = %path.display(), "Opening registry");
    Ok(FileRegistry::open(path)?)
}
