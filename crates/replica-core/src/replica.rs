//! Repository creation and replica (un)registration

use std::path::Path;

use replica_git::{AnnexBackend, Capabilities, CommitHash, GitRepository};

use crate::registry::{ContentCopy, NewContentCopy, Registry};
use crate::settings::Settings;
use crate::{Error, Result};

/// Create a repository at `path` with git-annex enabled and one commit.
///
/// An unknown `backend` name, or a machine without git-annex, is rejected
/// before anything is created.
pub fn init_repository(
    path: &Path,
    description: Option<&str>,
    backend: Option<&str>,
) -> Result<GitRepository> {
    let backend = backend.map(str::parse::<AnnexBackend>).transpose()?;
    Capabilities::detect().require_annex()?;
    let repo = GitRepository::init(path)?;
    repo.annex_init(description, backend)?;
    repo.initial_commit()?;
    Ok(repo)
}

/// Add the local repository as a content copy of `dataset_id`.
///
/// The copy records this host, the canonical repository path, the
/// abbreviated HEAD commit and a `<user>@<host>:<path>` identity. A copy
/// with the same host, path and commit is refused.
pub fn register_replica<R: Registry + ?Sized>(
    repo: &GitRepository,
    registry: &R,
    settings: &Settings,
    dataset_id: &str,
) -> Result<ContentCopy> {
    let path = repo.root().canonicalize()?.as_str().to_string();
    let commit = repo.commit_hash()?;
    let host = settings.hostname();

    let dataset = registry.get_dataset(dataset_id)?;
    if let Some(existing) = dataset
        .content_copies
        .iter()
        .find(|c| c.host() == host && c.path == path && same_commit(&c.commit, &commit))
    {
        return Err(Error::AlreadyRegistered {
            dataset: dataset_id.to_string(),
            host,
            path,
            commit: existing.commit.clone(),
        });
    }

    let identity = format!("{}@{}:{}", settings.user(), host, path);
    registry.register_content_copy(
        dataset_id,
        NewContentCopy {
            address: host,
            path,
            commit: commit.to_string(),
            identity: Some(identity),
        },
    )
}

/// Remove the content copy of `dataset_id` that points at the local
/// repository.
pub fn unregister_replica<R: Registry + ?Sized>(
    repo: &GitRepository,
    registry: &R,
    settings: &Settings,
    dataset_id: &str,
) -> Result<ContentCopy> {
    let path = repo.root().canonicalize()?.as_str().to_string();
    let host = settings.hostname();

    let dataset = registry.get_dataset(dataset_id)?;
    let copy = dataset
        .content_copies
        .iter()
        .find(|c| c.host() == host && c.path == path)
        .ok_or_else(|| Error::ReplicaNotRegistered {
            dataset: dataset_id.to_string(),
            host: host.clone(),
            path: path.clone(),
        })?;
    registry.remove_content_copy(dataset_id, copy.index)
}

pub(crate) fn same_commit(recorded: &str, head: &CommitHash) -> bool {
    match CommitHash::parse(recorded) {
        Ok(recorded) => recorded.matches(head),
        Err(_) => recorded == head.as_str(),
    }
}
