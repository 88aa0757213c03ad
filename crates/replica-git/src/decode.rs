//! Typed decoders for git command output
//!
//! One decoder per operation. A decoder only ever sees output from a process
//! that exited successfully; anything it cannot make sense of is
//! [`Error::Decode`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use replica_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{4,64}$").expect("valid commit hash pattern"));

static TREE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-7]{6}) (blob|tree|commit) ([0-9a-f]{40,64})\t(.+)$")
        .expect("valid tree entry pattern")
});

/// An abbreviated or full commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    /// Validate a commit identifier (4 to 64 lowercase hex digits).
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if COMMIT_HASH.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::decode(
                "commit hash",
                "expected 4 to 64 lowercase hex digits",
                value,
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two identifiers name the same commit, allowing either to be
    /// abbreviated.
    pub fn matches(&self, other: &CommitHash) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Git object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

/// One path tracked at HEAD, as listed by `ls-tree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: ObjectKind,
    pub object: String,
    /// Repository-relative path with forward slashes
    pub path: String,
}

impl TreeEntry {
    /// Symlink entries; git-annex records annexed content this way.
    pub fn is_symlink(&self) -> bool {
        self.mode == "120000"
    }
}

/// One line of `status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Status code as printed by git (`" M"`, `"??"`) or git-annex (`"M"`, `"?"`)
    pub code: String,
    pub path: String,
}

/// Decode `rev-parse --short HEAD`.
pub fn decode_commit_hash(output: &str) -> Result<CommitHash> {
    CommitHash::parse(output)
}

/// Decode `rev-parse --show-toplevel`.
pub fn decode_toplevel(output: &str) -> Result<NormalizedPath> {
    let line = output.trim_end_matches(['\n', '\r']);
    if line.is_empty() || line.contains('\n') {
        return Err(Error::decode(
            "toplevel",
            "expected exactly one path",
            output,
        ));
    }
    Ok(NormalizedPath::new(line))
}

/// Decode `ls-tree --full-tree -r -z HEAD`.
pub fn decode_tree(output: &str) -> Result<Vec<TreeEntry>> {
    output
        .split('\0')
        .filter(|record| !record.is_empty())
        .map(|record| {
            let caps = TREE_ENTRY
                .captures(record)
                .ok_or_else(|| Error::decode("ls-tree", "unrecognized entry", record))?;
            let kind = match &caps[2] {
                "blob" => ObjectKind::Blob,
                "tree" => ObjectKind::Tree,
                _ => ObjectKind::Commit,
            };
            Ok(TreeEntry {
                mode: caps[1].to_string(),
                kind,
                object: caps[3].to_string(),
                path: caps[4].to_string(),
            })
        })
        .collect()
}

/// Decode `status --porcelain -z`.
///
/// Rename and copy records carry the source path in the following field,
/// which is consumed and dropped.
pub fn decode_status(output: &str) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    let mut records = output.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        if record.len() < 4 || record.as_bytes()[2] != b' ' {
            return Err(Error::decode("status", "expected 'XY path'", record));
        }
        let code = &record[..2];
        if code.starts_with('R') || code.starts_with('C') {
            records.next();
        }
        entries.push(StatusEntry {
            code: code.to_string(),
            path: record[3..].to_string(),
        });
    }

    Ok(entries)
}

/// Decode `annex status`, one `X path` line per changed file.
pub fn decode_annex_status(output: &str) -> Result<Vec<StatusEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (code, path) = line
                .split_once(' ')
                .filter(|(code, path)| !code.is_empty() && !path.is_empty())
                .ok_or_else(|| Error::decode("annex status", "expected 'X path'", line))?;
            Ok(StatusEntry {
                code: code.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}
