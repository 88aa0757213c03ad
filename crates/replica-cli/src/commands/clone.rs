//! Clone and move command implementation

use std::path::Path;

use colored::Colorize;
use replica_core::{CloneOptions, CloneWorkflow, HostTransport, Settings};

use crate::cli::CloneArgs;
use crate::commands::open_registry;
use crate::error::Result;

/// Run `clone`, or `move` when `remove_source` is set.
pub fn run_clone(registry: Option<&Path>, args: &CloneArgs, remove_source: bool) -> Result<()> {
    let settings = Settings::load(None)?;
    let registry = open_registry(registry, &settings)?;
    let transport = HostTransport::new(settings.clone());

    let verb = if remove_source { "Moving" } else { "Cloning" };
    println!(
        "{} {} {} into {}...",
        "=>".blue().bold(),
        verb,
        args.dataset.cyan(),
        args.workdir.display()
    );

    let options = CloneOptions {
        content_copy_index: args.content_copy_index,
        ssh_user: args.ssh_user.clone(),
        skip_integrity_check: args.skip_integrity_check,
        remove_source,
    };
    let outcome = CloneWorkflow::new(&registry, &transport, &settings, &args.workdir)
        .run(&args.dataset, &options)?;

    println!(
        "   Source: {}:{} @ {}",
        outcome.source.address,
        outcome.source.path,
        outcome.source.commit.yellow()
    );
    if outcome.removed_source {
        println!("   Source copy unregistered");
    }
    println!(
        "{} Registered {} as content copy {}",
        "OK".green().bold(),
        outcome.repository.root(),
        outcome.registered.index
    );
    Ok(())
}
