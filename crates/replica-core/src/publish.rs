//! Publishing a repository as a data set
//!
//! `commit` stages and commits the working tree, then syncs. `sync` turns
//! HEAD into a new LINK data set whose file records come from the
//! [`ContentIndex`], registers the repository as its first content copy
//! and remembers the data set id in the repository settings.

use replica_checksum::Digest;
use replica_fs::RepoPath;
use replica_git::{GitRepository, StatusEntry};

use crate::index::{ContentIndex, RepositoryFile};
use crate::registry::{ContentCopy, DatasetRecord, Registry, RegistryFile};
use crate::replica::{register_replica, same_commit};
use crate::settings::{Settings, SettingsLayer, SettingsScope};
use crate::{Error, Result};

/// What a sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new data set was created with this repository as its first copy
    Published {
        dataset: DatasetRecord,
        copy: ContentCopy,
    },
    /// The last published data set already holds HEAD of this repository
    NothingToSync { dataset: String },
}

impl SyncOutcome {
    /// Permanent id of the data set the repository now belongs to.
    pub fn dataset_id(&self) -> &str {
        match self {
            Self::Published { dataset, .. } => &dataset.perm_id,
            Self::NothingToSync { dataset } => dataset,
        }
    }
}

/// Commit the working tree and publish the result.
///
/// With `auto_add` every change is staged first: through git-annex when the
/// repository has an annex, through plain git otherwise. No commit is made
/// when nothing is staged; the sync still runs. If the sync fails, HEAD is
/// moved back to the previous commit and the changes stay in the working
/// tree.
pub fn commit_repository<R: Registry + ?Sized>(
    repo: &GitRepository,
    registry: &R,
    settings: &Settings,
    message: &str,
    auto_add: bool,
) -> Result<SyncOutcome> {
    repo.ignore(RepoPath::ConfigFile.as_str())?;

    if auto_add {
        if repo.annex_enabled() {
            repo.add(".")?;
        } else {
            repo.add_all()?;
        }
    }

    let staged = repo
        .status(None, false)?
        .iter()
        .any(|entry| is_staged(&entry.code));
    if !staged {
        tracing::debug!(repo = %repo.root(), "Nothing staged, skipping commit");
        return sync_repository(repo, registry, settings);
    }

    let previous = if repo.head_exists()? {
        Some(repo.commit_hash()?)
    } else {
        None
    };
    let commit = repo.commit(message)?;
    tracing::info!(repo = %repo.root(), %commit, "Committed changes");

    let result = sync_repository(repo, registry, settings);
    if let Err(error) = &result {
        match &previous {
            Some(previous) => {
                tracing::warn!(%error, %previous, "Sync failed, moving HEAD back");
                repo.reset_to(previous)?;
            }
            None => tracing::warn!(%error, "Sync failed after the first commit, nothing to roll back to"),
        }
    }
    result
}

/// Publish HEAD as a new data set unless the last one already holds it.
pub fn sync_repository<R: Registry + ?Sized>(
    repo: &GitRepository,
    registry: &R,
    settings: &Settings,
) -> Result<SyncOutcome> {
    let root = repo.root().to_native();
    let stored = Settings::read_scope(SettingsScope::Repository(&root))?;

    if let Some(dataset_id) = stored.data_set_id
        && holds_head(repo, registry, settings, &dataset_id)?
    {
        tracing::info!(dataset = %dataset_id, "Nothing to sync");
        return Ok(SyncOutcome::NothingToSync {
            dataset: dataset_id,
        });
    }

    let index = ContentIndex::new(repo, settings.git_annex_hash_as_checksum)?;
    let files = index
        .files()?
        .map(|file| file.map(registry_file))
        .collect::<Result<Vec<_>>>()?;

    let dataset = registry.create_dataset(files)?;
    let copy = register_replica(repo, registry, settings, &dataset.perm_id)?;
    Settings::save_repository_layer(
        &root,
        SettingsLayer {
            data_set_id: Some(dataset.perm_id.clone()),
            ..SettingsLayer::default()
        },
    )?;

    tracing::info!(
        dataset = %dataset.perm_id,
        files = dataset.file_list.len(),
        commit = %copy.commit,
        "Published data set"
    );
    Ok(SyncOutcome::Published { dataset, copy })
}

/// Changed paths of the repository, from git or from git-annex.
pub fn repository_status(repo: &GitRepository, annex: bool) -> Result<Vec<StatusEntry>> {
    Ok(repo.status(None, annex)?)
}

fn holds_head<R: Registry + ?Sized>(
    repo: &GitRepository,
    registry: &R,
    settings: &Settings,
    dataset_id: &str,
) -> Result<bool> {
    let dataset = match registry.get_dataset(dataset_id) {
        Ok(dataset) => dataset,
        Err(Error::DatasetNotFound { .. }) => {
            tracing::warn!(dataset = dataset_id, "Last published data set is gone");
            return Ok(false);
        }
        Err(error) => return Err(error),
    };
    let path = repo.root().canonicalize()?.as_str().to_string();
    let commit = repo.commit_hash()?;
    let host = settings.hostname();
    Ok(dataset.content_copies.iter().any(|copy| {
        copy.host() == host && copy.path == path && same_commit(&copy.commit, &commit)
    }))
}

/// Porcelain `XY` codes: `X` is the index column.
fn is_staged(code: &str) -> bool {
    code.chars().next().is_some_and(|x| x != ' ' && x != '?')
}

fn registry_file(file: RepositoryFile) -> RegistryFile {
    let record = file.checksum;
    let checksum_crc32 = match record.checksum {
        Digest::Crc32(value) => Some(value),
        Digest::Text(_) => None,
    };
    RegistryFile {
        path: file.path,
        checksum_crc32,
        checksum_type: Some(record.kind.token().to_string()),
        checksum: Some(record.checksum.to_string()),
    }
}
