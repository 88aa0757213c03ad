//! Clone workflow: materialize a registered replica locally
//!
//! A clone runs five phases in a fixed order:
//!
//! 1. **SelectCopy**: pick one content copy of a LINK dataset
//! 2. **FetchBytes**: copy the repository into the working directory
//! 3. **PinCommit**: check out the commit the copy was registered at
//! 4. **Verify**: recompute checksums and compare with the registry
//! 5. **Register**: record the new replica as a content copy
//!
//! The only registry write happens in Register, so a failure in any earlier
//! phase leaves the registry untouched. Bytes already fetched stay on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use replica_git::{Capabilities, GitRepository};

use crate::registry::{ContentCopy, DatasetKind, DatasetRecord, Registry};
use crate::replica::register_replica;
use crate::settings::Settings;
use crate::transport::{RemoteLocation, Transport};
use crate::verify::validate_checksum;
use crate::{Error, Result};

/// Phase of a clone, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClonePhase {
    SelectCopy,
    FetchBytes,
    PinCommit,
    Verify,
    Register,
    RemoveSource,
}

impl fmt::Display for ClonePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectCopy => "select copy",
            Self::FetchBytes => "fetch bytes",
            Self::PinCommit => "pin commit",
            Self::Verify => "verify",
            Self::Register => "register",
            Self::RemoveSource => "remove source",
        };
        f.write_str(name)
    }
}

/// Caller choices for one clone.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Copy to clone; required when the dataset has more than one
    pub content_copy_index: Option<usize>,
    /// Login for the transport; falls back to the configured user
    pub ssh_user: Option<String>,
    pub skip_integrity_check: bool,
    /// Unregister the source copy after the new one is registered (move)
    pub remove_source: bool,
}

/// Result of a completed clone.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub repository: GitRepository,
    /// Copy the bytes came from, as it was selected
    pub source: ContentCopy,
    /// Copy registered for the new replica
    pub registered: ContentCopy,
    pub removed_source: bool,
}

/// Pick the content copy to clone.
///
/// With exactly one copy no index is needed. With several, `index` must
/// name one of them.
pub fn select_content_copy(
    dataset: &DatasetRecord,
    index: Option<usize>,
) -> Result<&ContentCopy> {
    if dataset.kind != DatasetKind::Link {
        return Err(Error::NotALink {
            dataset: dataset.perm_id.clone(),
            kind: dataset.kind.to_string(),
        });
    }
    let copies = &dataset.content_copies;
    match (copies.len(), index) {
        (0, _) => Err(Error::NoContentCopies {
            dataset: dataset.perm_id.clone(),
        }),
        (1, None) => Ok(&copies[0]),
        (count, None) => Err(Error::AmbiguousSelection {
            dataset: dataset.perm_id.clone(),
            count,
        }),
        (count, Some(index)) => copies
            .get(index)
            .ok_or_else(|| Error::ContentCopyIndexOutOfRange {
                dataset: dataset.perm_id.clone(),
                index,
                count,
            }),
    }
}

/// Drives a clone against one registry and transport.
pub struct CloneWorkflow<'a> {
    registry: &'a dyn Registry,
    transport: &'a dyn Transport,
    settings: &'a Settings,
    workdir: PathBuf,
}

impl<'a> CloneWorkflow<'a> {
    /// Clones land in `workdir/<last segment of the copy's path>`.
    pub fn new(
        registry: &'a dyn Registry,
        transport: &'a dyn Transport,
        settings: &'a Settings,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            transport,
            settings,
            workdir: workdir.into(),
        }
    }

    /// Clone `dataset_id`.
    ///
    /// # Errors
    ///
    /// Selection errors ([`Error::NotALink`], [`Error::NoContentCopies`],
    /// [`Error::AmbiguousSelection`], [`Error::ContentCopyIndexOutOfRange`])
    /// happen before any side effect, and so does a missing `git`.
    /// [`Error::IntegrityMismatch`] lists
    /// every file that failed verification; nothing is registered then.
    pub fn run(&self, dataset_id: &str, options: &CloneOptions) -> Result<CloneOutcome> {
        let mut phase = ClonePhase::SelectCopy;
        let result = self.execute(dataset_id, options, &mut phase);
        if let Err(error) = &result {
            tracing::error!(dataset = dataset_id, %phase, %error, "Clone failed");
        }
        result
    }

    fn enter(&self, phase: &mut ClonePhase, next: ClonePhase, dataset_id: &str) {
        *phase = next;
        tracing::info!(dataset = dataset_id, phase = %next, "Clone phase");
    }

    fn execute(
        &self,
        dataset_id: &str,
        options: &CloneOptions,
        phase: &mut ClonePhase,
    ) -> Result<CloneOutcome> {
        self.enter(phase, ClonePhase::SelectCopy, dataset_id);
        let dataset = self.registry.get_dataset(dataset_id)?;
        let source = select_content_copy(&dataset, options.content_copy_index)?.clone();
        let destination = self.destination_for(&source)?;
        Capabilities::detect().require_git()?;

        self.enter(phase, ClonePhase::FetchBytes, dataset_id);
        let location = RemoteLocation {
            user: options.ssh_user.clone().or_else(|| self.settings.user.clone()),
            host: source.host().to_string(),
            path: source.path.clone(),
        };
        tracing::debug!(%location, destination = %destination.display(), "Fetching content copy");
        self.transport.copy(&location, &destination)?;

        self.enter(phase, ClonePhase::PinCommit, dataset_id);
        let repository = GitRepository::open(destination.as_path())?;
        repository.checkout(&source.commit)?;

        if options.skip_integrity_check {
            tracing::warn!(dataset = dataset_id, "Skipping integrity check");
        } else {
            self.enter(phase, ClonePhase::Verify, dataset_id);
            // Re-read so the file list matches what the registry holds now
            let current = self.registry.get_dataset(&dataset.perm_id)?;
            let invalid = validate_checksum(
                self.registry,
                &current.file_list,
                &current.perm_id,
                &destination,
            )?;
            if !invalid.is_empty() {
                return Err(Error::IntegrityMismatch {
                    dataset: current.perm_id,
                    files: invalid,
                });
            }
        }

        self.enter(phase, ClonePhase::Register, dataset_id);
        let mut registered =
            register_replica(&repository, self.registry, self.settings, &dataset.perm_id)?;

        let removed_source = if options.remove_source {
            self.enter(phase, ClonePhase::RemoveSource, dataset_id);
            self.registry
                .remove_content_copy(&dataset.perm_id, source.index)?;
            if registered.index > source.index {
                registered.index -= 1;
            }
            true
        } else {
            false
        };

        tracing::info!(
            dataset = dataset_id,
            path = %repository.root(),
            commit = %source.commit,
            "Clone complete"
        );
        Ok(CloneOutcome {
            repository,
            source,
            registered,
            removed_source,
        })
    }

    fn destination_for(&self, copy: &ContentCopy) -> Result<PathBuf> {
        let name = copy.folder_name().ok_or_else(|| Error::InvalidContentCopy {
            message: format!("path {:?} has no final segment", copy.path),
        })?;
        let destination = self.workdir.join(name);
        if occupied(&destination)? {
            return Err(Error::DestinationExists { path: destination });
        }
        Ok(destination)
    }
}

/// Whether `path` exists as anything other than an empty directory.
fn occupied(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    if !path.is_dir() {
        return Ok(true);
    }
    let mut entries = std::fs::read_dir(path).map_err(|e| replica_fs::Error::io(path, e))?;
    Ok(entries.next().is_some())
}
