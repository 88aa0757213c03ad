//! Well-known paths inside a replica repository.

/// Repository-relative paths the backend and workflow rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoPath {
    /// The `.git` directory
    GitDir,
    /// git-annex object store and bookkeeping
    AnnexDir,
    /// Repo-local attributes file holding the pinned annex backend
    AttributesFile,
    /// Ignore file inside the bookkeeping folder
    BookkeepingIgnore,
    /// Repository-level settings file
    ConfigFile,
    /// Root `.gitignore`
    GitIgnore,
}

impl RepoPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::AnnexDir => ".git/annex",
            Self::AttributesFile => ".git/info/attributes",
            Self::BookkeepingIgnore => ".replica/.gitignore",
            Self::ConfigFile => ".replica/config.toml",
            Self::GitIgnore => ".gitignore",
        }
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
