//! Clone, verify and register dataset replicas
//!
//! This crate coordinates the layer-0 crates into the replica workflows:
//!
//! - **Content index**: per-file manifest of a repository with checksums
//! - **Integrity verifier**: recompute checksums and compare with the registry
//! - **Clone workflow**: select copy, fetch bytes, pin commit, verify, register
//! - **Replica registration**: add or remove a content copy for a local repository
//! - **Publishing**: commit a repository and register it as a new data set
//!
//! # Architecture
//!
//! ```text
//!                      CLI
//!                       |
//!                 replica-core
//!                       |
//!        +--------------+--------------+
//!        |              |              |
//!   replica-fs     replica-git    replica-checksum
//! ```
//!
//! The registry and the byte transport are external; they are reached only
//! through the [`Registry`] and [`Transport`] traits.

pub mod clone;
pub mod error;
pub mod index;
pub mod publish;
pub mod registry;
pub mod replica;
pub mod settings;
pub mod transport;
pub mod verify;

pub use clone::{CloneOptions, CloneOutcome, ClonePhase, CloneWorkflow, select_content_copy};
pub use error::{Error, Result};
pub use index::{ContentIndex, RepositoryFile, TrackedBy};
pub use publish::{SyncOutcome, commit_repository, repository_status, sync_repository};
pub use registry::{
    ContentCopy, DatasetKind, DatasetRecord, FileRegistry, MemoryRegistry, NewContentCopy,
    Registry, RegistryFile,
};
pub use replica::{init_repository, register_replica, unregister_replica};
pub use settings::{SETTING_KEYS, Settings, SettingsLayer, SettingsScope};
pub use transport::{HostTransport, LocalTransport, RemoteLocation, RsyncTransport, Transport};
pub use verify::validate_checksum;
