//! addref / removeref command implementation

use std::path::Path;

use colored::Colorize;
use replica_core::{Settings, register_replica, unregister_replica};
use replica_git::GitRepository;

use crate::commands::open_registry;
use crate::error::Result;

/// Register the repository containing `repository` as a content copy.
pub fn run_addref(registry: Option<&Path>, dataset_id: &str, repository: &Path) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;
    let registry = open_registry(registry, &settings)?;

    let copy = register_replica(&repo, &registry, &settings, dataset_id)?;
    println!(
        "{} Registered {}:{} @ {} as content copy {} of {}",
        "OK".green().bold(),
        copy.address,
        copy.path,
        copy.commit.yellow(),
        copy.index,
        dataset_id.cyan()
    );
    Ok(())
}

/// Unregister the content copy pointing at the repository containing `repository`.
pub fn run_removeref(registry: Option<&Path>, dataset_id: &str, repository: &Path) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;
    let registry = open_registry(registry, &settings)?;

    let copy = unregister_replica(&repo, &registry, &settings, dataset_id)?;
    println!(
        "{} Removed content copy {}:{} from {}",
        "OK".green().bold(),
        copy.address,
        copy.path,
        dataset_id.cyan()
    );
    Ok(())
}
