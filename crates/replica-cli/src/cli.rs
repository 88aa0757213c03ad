//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Replica - clone, verify and register dataset replicas
#[derive(Parser, Debug)]
#[command(name = "replica")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Registry file (JSON, YAML or TOML); overrides the configured registry
    #[arg(long, global = true, env = "REPLICA_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by `clone` and `move`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CloneArgs {
    /// Permanent identifier of the dataset
    pub dataset: String,

    /// Content copy to clone when the dataset has several
    #[arg(short = 'c', long)]
    pub content_copy_index: Option<usize>,

    /// Login used to reach the content copy's host
    #[arg(short = 'u', long)]
    pub ssh_user: Option<String>,

    /// Register the clone without recomputing checksums
    #[arg(short = 's', long)]
    pub skip_integrity_check: bool,

    /// Directory the clone is created in
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a repository with git-annex enabled
    ///
    /// Examples:
    ///   replica init data1                      # SHA256E backend
    ///   replica init data1 --backend WORM       # Pin another backend
    Init {
        /// Repository directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Description recorded by git-annex
        #[arg(short, long)]
        description: Option<String>,

        /// git-annex backend to pin (SHA256, SHA256E, MD5, MD5E, WORM)
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Print the content index of a repository as JSON lines
    Manifest {
        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,

        /// Compute CRC32 for every file instead of reading git-annex keys
        #[arg(long)]
        crc32: bool,
    },

    /// Check a local replica against the registry's checksums
    Verify {
        /// Permanent identifier of the dataset
        dataset: String,

        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,
    },

    /// Clone a registered replica and register the clone
    ///
    /// Examples:
    ///   replica clone 20240101-1                # Only one copy exists
    ///   replica clone 20240101-1 -c 1 -u alice  # Second copy, as alice
    Clone(CloneArgs),

    /// Clone a replica, then unregister the copy it came from
    Move(CloneArgs),

    /// Register a local repository as a content copy
    Addref {
        /// Permanent identifier of the dataset
        dataset: String,

        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,
    },

    /// Unregister the content copy that points at a local repository
    Removeref {
        /// Permanent identifier of the dataset
        dataset: String,

        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,
    },

    /// Commit the working tree and publish it as a new data set
    ///
    /// Examples:
    ///   replica commit -m "calibration run 4"   # Stage everything, commit, publish
    ///   replica commit -m fix --no-auto-add     # Commit only what is staged
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Commit only what is already staged
        #[arg(long)]
        no_auto_add: bool,

        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,
    },

    /// Publish HEAD as a new data set unless it is already registered
    Sync {
        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,
    },

    /// Show changed files and the last published data set
    Status {
        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,

        /// Ask git-annex instead of git
        #[arg(long)]
        annex: bool,
    },

    /// Read or change settings
    ///
    /// Examples:
    ///   replica config get                      # Effective settings
    ///   replica config set user=alice           # Repository setting
    ///   replica config -g set registry=/srv/registry.json
    ///   replica config clear hostname
    Config {
        /// Use the global settings file instead of the repository's
        #[arg(short, long)]
        global: bool,

        /// Repository directory
        #[arg(short, long, default_value = ".")]
        repository: PathBuf,

        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// What `config` does with the selected settings file
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print settings as key=value; every set key when none is named
    Get { keys: Vec<String> },

    /// Store KEY=VALUE pairs
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },

    /// Remove keys; every key when none is named
    Clear { keys: Vec<String> },
}
