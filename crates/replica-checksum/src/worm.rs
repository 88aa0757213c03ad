//! WORM identity: size and modification time, not content

use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::record::{ChecksumKind, ChecksumRecord, Digest};
use crate::{Error, Result};

/// Identity string `s<size>-m<mtime>--<relative>` for `root/relative`.
///
/// Matches the part of a git-annex WORM key after the backend prefix.
pub fn checksum(root: &Path, relative: &str) -> Result<ChecksumRecord> {
    let path = root.join(relative);
    let metadata = std::fs::metadata(&path).map_err(|e| Error::io(&path, e))?;
    let modified = metadata.modified().map_err(|e| Error::io(&path, e))?;
    let mtime = match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    };

    Ok(ChecksumRecord {
        kind: ChecksumKind::Worm,
        checksum: Digest::Text(format!("s{}-m{}--{}", metadata.len(), mtime, relative)),
        file_length: metadata.len(),
        path: relative.to_string(),
    })
}
