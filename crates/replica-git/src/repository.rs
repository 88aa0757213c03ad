//! Repository handle wrapping the git and git-annex command surface
//!
//! The handle carries the repository root explicitly; every command runs as
//! `git -C <root> ...` and nothing depends on the process working directory.

use std::fs;
use std::path::Path;

use replica_fs::{NormalizedPath, RepoPath, io};

use crate::annex::{self, AnnexBackend, AnnexFileInfo};
use crate::command::{CommandOutput, ExternalCommand};
use crate::decode::{self, CommitHash, StatusEntry, TreeEntry};
use crate::tools::Capabilities;
use crate::{Error, Result};

/// Repository format version requested from git-annex at init.
pub const ANNEX_REPO_VERSION: u32 = 5;

/// Message of the commit that guarantees a rollback target exists.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit.";

/// Substrings git-annex prints when a path has no annex key.
const NOT_ANNEXED_MARKERS: &[&str] = &[
    "not a valid object name",
    "not an annexed file",
    "not a directory or an annexed file",
];

/// Handle to a local repository working directory.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: NormalizedPath,
}

impl GitRepository {
    /// Open an existing repository rooted at `root`.
    pub fn open(root: impl Into<NormalizedPath>) -> Result<Self> {
        let root = root.into();
        if !root.join(RepoPath::GitDir.as_str()).exists() {
            return Err(Error::NotARepository {
                path: root.to_native(),
            });
        }
        Ok(Self { root })
    }

    /// Find the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let output = ExternalCommand::git()
            .arg("-C")
            .arg(path.as_ref())
            .args(["rev-parse", "--show-toplevel"])
            .output()?;
        if !output.success() {
            return Err(Error::NotARepository {
                path: path.as_ref().to_path_buf(),
            });
        }
        let root = decode::decode_toplevel(&output.stdout)?;
        Self::open(root)
    }

    /// Create a new repository at `path` (`git init <path>`).
    pub fn init(path: impl Into<NormalizedPath>) -> Result<Self> {
        let root = path.into();
        ExternalCommand::git()
            .arg("init")
            .arg(root.to_native())
            .run()?;
        tracing::info!(path = %root, "Initialized git repository");
        Ok(Self { root })
    }

    /// Repository root directory.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Whether both `git` and `git annex` answer on this machine.
    ///
    /// The tools are asked once per process; see [`Capabilities::detect`].
    pub fn can_run(&self) -> bool {
        Capabilities::detect().all()
    }

    /// Absolute path of a repository-relative path.
    pub fn path_of(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    fn git(&self) -> ExternalCommand {
        ExternalCommand::git().arg("-C").arg(self.root.to_native())
    }

    /// Enable git-annex and pin the checksum backend.
    ///
    /// Sequence: `annex init --version=5 [description]`, `annex.thin`,
    /// `annex direct` (skipped with a warning on annex versions without
    /// direct mode), unset `core.bare`, then write the attributes file.
    /// Refuses to run if the attributes file already pins a backend.
    pub fn annex_init(
        &self,
        description: Option<&str>,
        backend: Option<AnnexBackend>,
    ) -> Result<()> {
        let attributes = self.path_of(RepoPath::AttributesFile.as_str());
        if let Some(existing) = annex::read_backend_name(&attributes)? {
            return Err(Error::BackendAlreadyPinned {
                backend: existing,
                path: attributes.to_native(),
            });
        }

        let mut init = self
            .git()
            .args(["annex", "init"])
            .arg(format!("--version={ANNEX_REPO_VERSION}"));
        if let Some(description) = description {
            init = init.arg(description);
        }
        init.run()?;

        self.git().args(["config", "annex.thin", "true"]).run()?;

        let direct = self.git().args(["annex", "direct"]).output()?;
        if !direct.success() {
            tracing::warn!(
                path = %self.root,
                stderr = %direct.stderr.trim(),
                "annex direct mode unavailable, continuing with thin mode only"
            );
        }

        // `annex direct` flips core.bare on; ordinary non-bare semantics are
        // restored here. Exit 5 means the key was already unset.
        let unset = self.git().args(["config", "--unset", "core.bare"]).output()?;
        if !unset.success() && unset.status != Some(5) {
            return Err(Error::CommandFailed {
                command: "git config --unset core.bare".into(),
                status: unset.status,
                stdout: unset.stdout,
                stderr: unset.stderr,
            });
        }

        io::write_text(&attributes, &annex::render_attributes(backend))?;
        tracing::info!(
            path = %self.root,
            backend = %backend.map(|b| b.as_str()).unwrap_or("template default"),
            "Enabled git-annex"
        );
        Ok(())
    }

    /// The backend pinned in the attributes file, if any.
    pub fn annex_backend(&self) -> Result<Option<AnnexBackend>> {
        let attributes = self.path_of(RepoPath::AttributesFile.as_str());
        annex::read_backend_name(&attributes)?
            .map(|name| name.parse::<AnnexBackend>())
            .transpose()
    }

    /// Make sure at least one commit exists.
    ///
    /// Writes the bookkeeping folder's ignore file and commits it with a
    /// plain `git add`. Returns the new commit, or `None` if HEAD already
    /// existed.
    pub fn initial_commit(&self) -> Result<Option<CommitHash>> {
        if self.head_exists()? {
            return Ok(None);
        }
        let ignore = self.path_of(RepoPath::BookkeepingIgnore.as_str());
        io::write_text(&ignore, "*.log\n")?;
        self.git()
            .args(["add", "--", RepoPath::BookkeepingIgnore.as_str()])
            .run()?;
        self.commit(INITIAL_COMMIT_MESSAGE).map(Some)
    }

    /// Stage `path` through git-annex so large files are streamed, not buffered.
    pub fn add(&self, path: &str) -> Result<CommandOutput> {
        self.git()
            .args(["annex", "add", path, "--include-dotfiles"])
            .run()
    }

    /// Stage every change in the working tree with plain `git add --all`.
    pub fn add_all(&self) -> Result<()> {
        self.git().args(["add", "--all"]).run()?;
        Ok(())
    }

    /// Whether git-annex has been initialized in this repository.
    pub fn annex_enabled(&self) -> bool {
        self.path_of(RepoPath::AnnexDir.as_str()).is_dir()
    }

    /// Commit staged changes and return the new HEAD.
    pub fn commit(&self, message: &str) -> Result<CommitHash> {
        self.git().args(["commit", "-m", message]).run()?;
        self.commit_hash()
    }

    /// Check out a branch, tag or commit.
    pub fn checkout(&self, rev: &str) -> Result<()> {
        self.git().args(["checkout", rev]).run()?;
        Ok(())
    }

    /// Move the current branch to `hash` (mixed reset).
    pub fn reset_to(&self, hash: &CommitHash) -> Result<()> {
        self.git().args(["reset", hash.as_str()]).run()?;
        Ok(())
    }

    /// Every path tracked at HEAD.
    pub fn ls_tree(&self) -> Result<Vec<TreeEntry>> {
        let output = self
            .git()
            .args(["ls-tree", "--full-tree", "-r", "-z", "HEAD"])
            .run()?;
        decode::decode_tree(&output.stdout)
    }

    /// HEAD's abbreviated commit identifier.
    pub fn commit_hash(&self) -> Result<CommitHash> {
        let output = self.git().args(["rev-parse", "--short", "HEAD"]).run()?;
        decode::decode_commit_hash(&output.stdout)
    }

    /// Whether HEAD resolves to a commit.
    pub fn head_exists(&self) -> Result<bool> {
        let output = self
            .git()
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .output()?;
        Ok(output.success())
    }

    /// Changed paths, optionally restricted to `path`.
    ///
    /// `annex = true` asks git-annex (content presence); `annex = false` asks
    /// git (byte changes).
    pub fn status(&self, path: Option<&str>, annex: bool) -> Result<Vec<StatusEntry>> {
        if annex {
            let mut cmd = self.git().args(["annex", "status"]);
            if let Some(path) = path {
                cmd = cmd.arg(path);
            }
            decode::decode_annex_status(&cmd.run()?.stdout)
        } else {
            let mut cmd = self.git().args(["status", "--porcelain", "-z"]);
            if let Some(path) = path {
                cmd = cmd.arg("--").arg(path);
            }
            decode::decode_status(&cmd.run()?.stdout)
        }
    }

    /// Whether git tracks `path`.
    pub fn is_tracked(&self, path: &str) -> Result<bool> {
        let output = self
            .git()
            .args(["ls-files", "--error-unmatch", "--", path])
            .output()?;
        match output.status {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            status => Err(Error::CommandFailed {
                command: format!("git ls-files --error-unmatch -- {path}"),
                status,
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }

    /// Add `path` to the root `.gitignore` unless it is already ignored.
    ///
    /// Returns `true` if the ignore file was changed.
    pub fn ignore(&self, path: &str) -> Result<bool> {
        let output = self
            .git()
            .args(["check-ignore", "-q", "--", path])
            .output()?;
        match output.status {
            Some(0) => Ok(false),
            Some(1) => {
                io::append_line(&self.path_of(RepoPath::GitIgnore.as_str()), path)?;
                Ok(true)
            }
            status => Err(Error::CommandFailed {
                command: format!("git check-ignore -q -- {path}"),
                status,
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }

    /// Delete `path` from the working tree if git does not track it.
    ///
    /// Tracked files are never touched. Returns `true` if a file was removed.
    pub fn delete_if_untracked(&self, path: &str) -> Result<bool> {
        if self.is_tracked(path)? {
            return Ok(false);
        }
        let target = self.path_of(path).to_native();
        if !target.exists() {
            return Ok(false);
        }
        fs::remove_file(&target).map_err(|e| replica_fs::Error::io(&target, e))?;
        tracing::debug!(path, "Removed untracked file");
        Ok(true)
    }

    /// Key metadata git-annex holds for `path`.
    ///
    /// Returns `None` when annex has no key for the path (plain git file or
    /// untracked file).
    pub fn annex_info(&self, path: &str) -> Result<Option<AnnexFileInfo>> {
        let output = self
            .git()
            .args(["annex", "info", "--json", "--fast", path])
            .output()?;

        if !output.success() {
            let text = format!("{}{}", output.stdout, output.stderr).to_lowercase();
            if NOT_ANNEXED_MARKERS.iter().any(|m| text.contains(m)) {
                return Ok(None);
            }
            return Err(Error::CommandFailed {
                command: format!("git annex info --json --fast {path}"),
                status: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let info = annex::decode_annex_info(&output.stdout)?;
        Ok(info.key.is_some().then_some(info))
    }
}
