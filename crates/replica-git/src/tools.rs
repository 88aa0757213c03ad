//! Which external tools answer on this machine
//!
//! `git help` and `git annex help` are asked once per process; every
//! repository handle shares the answer.

use std::sync::OnceLock;

use crate::command::ExternalCommand;
use crate::{Error, Result};

static DETECTED: OnceLock<Capabilities> = OnceLock::new();

/// Which tools answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub git: bool,
    pub annex: bool,
}

impl Capabilities {
    /// Ask the tools, or return the answer of an earlier call.
    pub fn detect() -> Self {
        *DETECTED.get_or_init(|| {
            let capabilities = Self::ask();
            tracing::debug!(git = capabilities.git, annex = capabilities.annex, "Checked tools");
            capabilities
        })
    }

    fn ask() -> Self {
        let answers = |cmd: ExternalCommand| cmd.output().map(|o| o.success()).unwrap_or(false);
        let git = answers(ExternalCommand::git().arg("help"));
        let annex = git && answers(ExternalCommand::git().args(["annex", "help"]));
        Self { git, annex }
    }

    /// Both git and git-annex answered.
    pub fn all(&self) -> bool {
        self.git && self.annex
    }

    pub fn require_git(&self) -> Result<()> {
        if self.git {
            Ok(())
        } else {
            Err(Error::ToolUnavailable { tool: "git" })
        }
    }

    /// git and git-annex are both needed.
    pub fn require_annex(&self) -> Result<()> {
        self.require_git()?;
        if self.annex {
            Ok(())
        } else {
            Err(Error::ToolUnavailable { tool: "git-annex" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_git_is_reported_before_annex() {
        let nothing = Capabilities {
            git: false,
            annex: false,
        };
        assert!(matches!(
            nothing.require_annex(),
            Err(Error::ToolUnavailable { tool: "git" })
        ));
    }

    #[test]
    fn git_without_annex() {
        let plain = Capabilities {
            git: true,
            annex: false,
        };
        assert!(plain.require_git().is_ok());
        assert!(!plain.all());
        assert!(matches!(
            plain.require_annex(),
            Err(Error::ToolUnavailable { tool: "git-annex" })
        ));
    }

    #[test]
    fn detect_is_stable() {
        assert_eq!(Capabilities::detect(), Capabilities::detect());
    }
}
