//! Init command implementation

use std::path::Path;

use colored::Colorize;
use replica_core::Settings;
use replica_git::AnnexBackend;

use crate::error::Result;

/// Run the init command
///
/// The backend comes from the flag, then from the configured
/// `git_annex_backend`, then from the attributes template.
pub fn run_init(path: &Path, description: Option<&str>, backend: Option<&str>) -> Result<()> {
    let settings = Settings::load(None)?;
    let backend = backend.or(settings.git_annex_backend.as_deref());

    println!(
        "{} Initializing replica repository in {}...",
        "=>".blue().bold(),
        path.display().to_string().cyan()
    );
    if let Some(backend) = backend {
        println!("   Backend: {}", backend.yellow());
    }

    let repo = match replica_core::init_repository(path, description, backend) {
        Ok(repo) => repo,
        Err(error) => {
            if error.is_unsupported_backend() {
                let supported: Vec<&str> = AnnexBackend::ALL.iter().map(|b| b.as_str()).collect();
                eprintln!("   Supported backends: {}", supported.join(", ").yellow());
            }
            return Err(error.into());
        }
    };

    println!(
        "{} Repository initialized at {}",
        "OK".green().bold(),
        repo.root()
    );
    Ok(())
}
