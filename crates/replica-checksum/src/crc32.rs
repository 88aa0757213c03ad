//! CRC32 via the POSIX `cksum` command

use std::path::Path;

use replica_git::ExternalCommand;

use crate::record::{ChecksumKind, ChecksumRecord, Digest};
use crate::{Error, Result};

/// Compute the `cksum` CRC of `root/relative`.
///
/// `cksum` prints `<crc> <length> <name>`; both numbers are taken from its
/// output rather than from filesystem metadata.
pub fn checksum(root: &Path, relative: &str) -> Result<ChecksumRecord> {
    let path = root.join(relative);
    std::fs::metadata(&path).map_err(|e| Error::io(&path, e))?;

    let output = ExternalCommand::new("cksum").arg(&path).run()?;
    let (crc, length) = parse_cksum(&output.stdout).ok_or_else(|| Error::CksumOutput {
        path: path.clone(),
        output: output.stdout.clone(),
    })?;

    Ok(ChecksumRecord {
        kind: ChecksumKind::Crc32,
        checksum: Digest::Crc32(crc),
        file_length: length,
        path: relative.to_string(),
    })
}

fn parse_cksum(output: &str) -> Option<(u32, u64)> {
    let mut fields = output.split_whitespace();
    let crc = fields.next()?.parse().ok()?;
    let length = fields.next()?.parse().ok()?;
    Some((crc, length))
}
