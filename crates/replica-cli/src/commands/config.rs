//! Config command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;
use replica_core::settings::global_dir;
use replica_core::{SETTING_KEYS, Settings, SettingsLayer, SettingsScope};
use replica_git::GitRepository;

use crate::cli::ConfigAction;
use crate::error::{CliError, Result};

/// Run the config command against the global file or the repository's.
pub fn run_config(global: bool, repository: &Path, action: &ConfigAction) -> Result<()> {
    let root: Option<PathBuf> = if global {
        None
    } else {
        Some(GitRepository::discover(repository)?.root().to_native())
    };
    let scope = match &root {
        Some(root) => SettingsScope::Repository(root.as_path()),
        None => SettingsScope::Global,
    };

    match action {
        ConfigAction::Get { keys } => {
            let layer = match &root {
                Some(root) => Settings::merged_layer(global_dir().as_deref(), Some(root.as_path()))?,
                None => Settings::read_scope(scope)?,
            };
            print_layer(&layer, keys)
        }
        ConfigAction::Set { pairs } => {
            let mut layer = Settings::read_scope(scope)?;
            for pair in pairs {
                let (key, value) = pair.split_once('=').ok_or_else(|| {
                    CliError::user(format!("Expected KEY=VALUE, got '{pair}'"))
                })?;
                layer.set(key.trim(), value.trim())?;
            }
            Settings::write_scope(scope, &layer)?;
            println!("{} Saved {} setting(s)", "OK".green().bold(), pairs.len());
            Ok(())
        }
        ConfigAction::Clear { keys } => {
            let mut layer = if keys.is_empty() {
                SettingsLayer::default()
            } else {
                Settings::read_scope(scope)?
            };
            for key in keys {
                layer.clear(key)?;
            }
            Settings::write_scope(scope, &layer)?;
            println!("{} Cleared settings", "OK".green().bold());
            Ok(())
        }
    }
}

/// Named keys are always printed; without names only set keys are.
fn print_layer(layer: &SettingsLayer, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
        for key in SETTING_KEYS {
            if let Some(value) = layer.get(key)? {
                println!("{key}={value}");
            }
        }
        return Ok(());
    }
    for key in keys {
        let value = layer.get(key)?.unwrap_or_default();
        println!("{key}={value}");
    }
    Ok(())
}
