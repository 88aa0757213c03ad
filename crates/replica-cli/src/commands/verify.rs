//! Verify command implementation

use std::path::Path;

use colored::Colorize;
use replica_core::{Registry, Settings, validate_checksum};
use replica_git::GitRepository;

use crate::commands::open_registry;
use crate::error::Result;

/// Recompute the checksums of a local replica and compare with the registry.
pub fn run_verify(registry: Option<&Path>, dataset_id: &str, repository: &Path) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let root = repo.root().to_native();
    let settings = Settings::load(Some(root.as_path()))?;
    let registry = open_registry(registry, &settings)?;

    let dataset = registry.get_dataset(dataset_id)?;
    println!(
        "{} Verifying {} files of {}...",
        "=>".blue().bold(),
        dataset.file_list.len(),
        dataset_id.cyan()
    );

    let invalid = validate_checksum(&registry, &dataset.file_list, dataset_id, &root)?;
    if invalid.is_empty() {
        println!("{} All checksums match", "OK".green().bold());
        return Ok(());
    }

    for path in &invalid {
        println!("   {} {}", "MISMATCH".red().bold(), path);
    }
    Err(replica_core::Error::IntegrityMismatch {
        dataset: dataset_id.to_string(),
        files: invalid,
    }
    .into())
}
