//! Filesystem helpers for dataset replicas
//!
//! Provides normalized paths, atomic writes and format-agnostic config files.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Format};
pub use constants::RepoPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
