//! Layered settings for replica operations
//!
//! Settings are read from two TOML layers, later overriding earlier:
//!
//! 1. Global (`<config_dir>/replica/config.toml`)
//! 2. Repository (`.replica/config.toml`)
//!
//! A layer only overrides the fields it sets. Missing layers are skipped;
//! an unparsable layer is an error. Single fields of a layer are read and
//! written by name through [`SettingsLayer::get`], [`SettingsLayer::set`]
//! and [`SettingsLayer::clear`].

use std::path::{Path, PathBuf};

use replica_fs::{ConfigStore, NormalizedPath, RepoPath};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Hostname used when neither the settings, the environment nor the
/// system name one.
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Names accepted by [`SettingsLayer::get`], `set` and `clear`.
pub const SETTING_KEYS: [&str; 6] = [
    "user",
    "hostname",
    "git_annex_hash_as_checksum",
    "git_annex_backend",
    "registry",
    "data_set_id",
];

/// Which settings file an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope<'a> {
    /// `<config_dir>/replica/config.toml`
    Global,
    /// `.replica/config.toml` of the repository rooted here
    Repository(&'a Path),
}

/// One settings file. Every field is optional so layers can be stacked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsLayer {
    pub user: Option<String>,
    pub hostname: Option<String>,
    pub git_annex_hash_as_checksum: Option<bool>,
    pub git_annex_backend: Option<String>,
    pub registry: Option<PathBuf>,
    pub data_set_id: Option<String>,
}

impl SettingsLayer {
    /// Overlay `other` onto `self`; fields set in `other` win.
    pub fn merge(&mut self, other: SettingsLayer) {
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.hostname.is_some() {
            self.hostname = other.hostname;
        }
        if other.git_annex_hash_as_checksum.is_some() {
            self.git_annex_hash_as_checksum = other.git_annex_hash_as_checksum;
        }
        if other.git_annex_backend.is_some() {
            self.git_annex_backend = other.git_annex_backend;
        }
        if other.registry.is_some() {
            self.registry = other.registry;
        }
        if other.data_set_id.is_some() {
            self.data_set_id = other.data_set_id;
        }
    }

    /// Value of `key` as text, `None` when the layer leaves it unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(match key {
            "user" => self.user.clone(),
            "hostname" => self.hostname.clone(),
            "git_annex_hash_as_checksum" => self.git_annex_hash_as_checksum.map(|b| b.to_string()),
            "git_annex_backend" => self.git_annex_backend.clone(),
            "registry" => self.registry.as_ref().map(|p| p.display().to_string()),
            "data_set_id" => self.data_set_id.clone(),
            _ => return Err(unknown_setting(key)),
        })
    }

    /// Parse `value` into the field named `key`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "user" => self.user = Some(value.to_string()),
            "hostname" => self.hostname = Some(value.to_string()),
            "git_annex_hash_as_checksum" => {
                let flag = value.parse::<bool>().map_err(|_| Error::InvalidSetting {
                    key: key.to_string(),
                    value: value.to_string(),
                    message: "expected true or false".into(),
                })?;
                self.git_annex_hash_as_checksum = Some(flag);
            }
            "git_annex_backend" => {
                let backend = value.parse::<replica_git::AnnexBackend>()?;
                self.git_annex_backend = Some(backend.to_string());
            }
            "registry" => self.registry = Some(PathBuf::from(value)),
            "data_set_id" => self.data_set_id = Some(value.to_string()),
            _ => return Err(unknown_setting(key)),
        }
        Ok(())
    }

    /// Unset `key`.
    pub fn clear(&mut self, key: &str) -> Result<()> {
        match key {
            "user" => self.user = None,
            "hostname" => self.hostname = None,
            "git_annex_hash_as_checksum" => self.git_annex_hash_as_checksum = None,
            "git_annex_backend" => self.git_annex_backend = None,
            "registry" => self.registry = None,
            "data_set_id" => self.data_set_id = None,
            _ => return Err(unknown_setting(key)),
        }
        Ok(())
    }
}

fn unknown_setting(key: &str) -> Error {
    Error::UnknownSetting {
        key: key.to_string(),
    }
}

/// Effective settings after merging all layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Login name recorded in replica identities and used for rsync
    pub user: Option<String>,
    /// Name of this machine as recorded in content copies
    pub hostname: Option<String>,
    /// Take checksums from git-annex keys instead of hashing every file
    pub git_annex_hash_as_checksum: bool,
    /// Backend pinned by `init` when none is given on the command line
    pub git_annex_backend: Option<String>,
    /// Location of the file-backed registry
    pub registry: Option<PathBuf>,
    /// Data set most recently published from this repository
    pub data_set_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user: None,
            hostname: None,
            git_annex_hash_as_checksum: true,
            git_annex_backend: None,
            registry: None,
            data_set_id: None,
        }
    }
}

impl From<SettingsLayer> for Settings {
    fn from(layer: SettingsLayer) -> Self {
        let defaults = Settings::default();
        Self {
            user: layer.user,
            hostname: layer.hostname,
            git_annex_hash_as_checksum: layer
                .git_annex_hash_as_checksum
                .unwrap_or(defaults.git_annex_hash_as_checksum),
            git_annex_backend: layer.git_annex_backend,
            registry: layer.registry,
            data_set_id: layer.data_set_id,
        }
    }
}

impl Settings {
    /// Load settings for `repository` (or only the global layer when `None`).
    pub fn load(repository: Option<&Path>) -> Result<Self> {
        Self::load_from(global_dir().as_deref(), repository)
    }

    /// Load settings with an explicit global config directory.
    pub fn load_from(global_dir: Option<&Path>, repository: Option<&Path>) -> Result<Self> {
        Ok(Self::merged_layer(global_dir, repository)?.into())
    }

    /// Global and repository layers merged, before defaults are applied.
    pub fn merged_layer(
        global_dir: Option<&Path>,
        repository: Option<&Path>,
    ) -> Result<SettingsLayer> {
        let mut merged = SettingsLayer::default();

        if let Some(dir) = global_dir {
            let path = NormalizedPath::new(dir.join("config.toml"));
            if let Some(layer) = read_layer(&path)? {
                tracing::debug!(path = %path, "Loaded global settings");
                merged.merge(layer);
            }
        }

        if let Some(root) = repository {
            let path = repository_file(root);
            if let Some(layer) = read_layer(&path)? {
                tracing::debug!(path = %path, "Loaded repository settings");
                merged.merge(layer);
            }
        }

        Ok(merged)
    }

    /// Hostname for content copies: settings, then `$HOSTNAME`, then the
    /// system hostname, then `localhost`.
    pub fn hostname(&self) -> String {
        resolve_hostname(self.hostname.as_deref(), std::env::var("HOSTNAME").ok())
    }

    /// User for identities: settings, then `$USER`, then `unknown`.
    pub fn user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Whether `host` names this machine.
    pub fn is_local_host(&self, host: &str) -> bool {
        host == DEFAULT_HOSTNAME || host == "127.0.0.1" || host == self.hostname()
    }

    /// Write the repository layer, keeping fields this call does not set.
    pub fn save_repository_layer(root: &Path, layer: SettingsLayer) -> Result<()> {
        let mut current = Self::read_scope(SettingsScope::Repository(root))?;
        current.merge(layer);
        Self::write_scope(SettingsScope::Repository(root), &current)
    }

    /// The single layer stored for `scope`; empty when the file is absent.
    pub fn read_scope(scope: SettingsScope<'_>) -> Result<SettingsLayer> {
        Ok(read_layer(&scope_file(scope)?)?.unwrap_or_default())
    }

    /// Replace the layer stored for `scope`.
    pub fn write_scope(scope: SettingsScope<'_>, layer: &SettingsLayer) -> Result<()> {
        let path = scope_file(scope)?;
        ConfigStore::new().save(&path, layer)?;
        tracing::debug!(path = %path, "Saved settings");
        Ok(())
    }
}

/// `<config_dir>/replica`, if the platform has a config directory.
pub fn global_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("replica"))
}

fn scope_file(scope: SettingsScope<'_>) -> Result<NormalizedPath> {
    match scope {
        SettingsScope::Global => global_dir()
            .map(|dir| NormalizedPath::new(dir.join("config.toml")))
            .ok_or(Error::NoConfigDirectory),
        SettingsScope::Repository(root) => Ok(repository_file(root)),
    }
}

fn repository_file(root: &Path) -> NormalizedPath {
    NormalizedPath::new(root).join(RepoPath::ConfigFile.as_str())
}

fn resolve_hostname(configured: Option<&str>, env: Option<String>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| env.filter(|h| !h.is_empty()))
        .or_else(system_hostname)
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string())
}

fn system_hostname() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.is_empty())
}

fn read_layer(path: &NormalizedPath) -> Result<Option<SettingsLayer>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(ConfigStore::new().load(path)?))
}
