//! git and git-annex command backend for dataset replicas
//!
//! Every repository operation is one blocking `git` process. Output is
//! decoded by a dedicated decoder per operation so that a process that could
//! not start, a process that failed, and a process whose output made no sense
//! are three different errors.

pub mod annex;
pub mod command;
pub mod decode;
pub mod error;
pub mod repository;
pub mod tools;

pub use annex::{AnnexBackend, AnnexFileInfo, AnnexKey};
pub use command::{CommandOutput, ExternalCommand};
pub use decode::{CommitHash, ObjectKind, StatusEntry, TreeEntry};
pub use error::{Error, Result};
pub use repository::GitRepository;
pub use tools::Capabilities;
