//! commit / sync / status command implementation

use std::path::Path;

use colored::Colorize;
use replica_core::{
    Settings, SyncOutcome, commit_repository, repository_status, sync_repository,
};
use replica_git::GitRepository;

use crate::commands::open_registry;
use crate::error::Result;

/// Run the commit command
pub fn run_commit(
    registry: Option<&Path>,
    repository: &Path,
    message: &str,
    auto_add: bool,
) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;
    let registry = open_registry(registry, &settings)?;

    println!(
        "{} Committing {}...",
        "=>".blue().bold(),
        repo.root().to_string().cyan()
    );
    let outcome = commit_repository(&repo, &registry, &settings, message, auto_add)?;
    report(&outcome);
    Ok(())
}

/// Run the sync command
pub fn run_sync(registry: Option<&Path>, repository: &Path) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;
    let registry = open_registry(registry, &settings)?;

    let outcome = sync_repository(&repo, &registry, &settings)?;
    report(&outcome);
    Ok(())
}

/// Run the status command
pub fn run_status(repository: &Path, annex: bool) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;

    if let Some(dataset) = &settings.data_set_id {
        println!("Data set: {}", dataset.cyan());
    }

    let entries = repository_status(&repo, annex)?;
    if entries.is_empty() {
        println!("{} Nothing changed", "OK".green().bold());
        return Ok(());
    }
    for entry in entries {
        println!("{} {}", entry.code, entry.path);
    }
    Ok(())
}

fn report(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Published { dataset, copy } => println!(
            "{} Published data set {} with {} files; content copy {} at {}:{} @ {}",
            "OK".green().bold(),
            dataset.perm_id.cyan(),
            dataset.file_list.len(),
            copy.index,
            copy.address,
            copy.path,
            copy.commit.yellow()
        ),
        SyncOutcome::NothingToSync { dataset } => println!(
            "{} Nothing to sync; {} already holds HEAD",
            "=>".blue().bold(),
            dataset.cyan()
        ),
    }
}
