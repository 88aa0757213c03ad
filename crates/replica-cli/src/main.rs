//! Replica CLI
//!
//! Command-line interface for cloning, verifying and registering dataset
//! replicas.

mod cli;
mod commands;
mod error;
mod logging;

use std::io;
use std::path::Path;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging unavailable: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(command = ?cli.command, "Parsed arguments");

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.registry.as_deref()),
        None => {
            println!("{} dataset replica manager", "replica".green().bold());
            println!();
            println!("Run {} for available commands.", "replica --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, registry: Option<&Path>) -> Result<()> {
    match cmd {
        Commands::Init {
            path,
            description,
            backend,
        } => commands::run_init(&path, description.as_deref(), backend.as_deref()),
        Commands::Manifest { repository, crc32 } => commands::run_manifest(&repository, crc32),
        Commands::Verify {
            dataset,
            repository,
        } => commands::run_verify(registry, &dataset, &repository),
        Commands::Clone(args) => commands::run_clone(registry, &args, false),
        Commands::Move(args) => commands::run_clone(registry, &args, true),
        Commands::Addref {
            dataset,
            repository,
        } => commands::run_addref(registry, &dataset, &repository),
        Commands::Removeref {
            dataset,
            repository,
        } => commands::run_removeref(registry, &dataset, &repository),
        Commands::Commit {
            message,
            no_auto_add,
            repository,
        } => commands::run_commit(registry, &repository, &message, !no_auto_add),
        Commands::Sync { repository } => commands::run_sync(registry, &repository),
        Commands::Status { repository, annex } => commands::run_status(&repository, annex),
        Commands::Config {
            global,
            repository,
            action,
        } => commands::run_config(global, &repository, &action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "replica", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_missing_registry_is_user_error() {
        let settings = replica_core::Settings::default();
        let result = commands::open_registry(None, &settings);
        assert!(matches!(result, Err(crate::error::CliError::User { .. })));
    }
}
