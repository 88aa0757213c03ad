//! Integrity check of a local replica against registry checksums

use std::collections::HashMap;
use std::path::Path;

use replica_checksum::{ChecksumGenerator, Digest, get_checksum_generator};

use crate::registry::{Registry, RegistryFile};
use crate::{Error, Result};

/// What a registry record says a file's checksum must be.
enum Expectation<'a> {
    Crc32(u32),
    Typed {
        generator: ChecksumGenerator,
        checksum: Option<&'a str>,
    },
}

impl<'a> Expectation<'a> {
    /// A nonzero CRC32 wins over a typed checksum; a record with neither
    /// is not checked.
    fn of(file: &'a RegistryFile) -> Option<Self> {
        if let Some(crc) = file.checksum_crc32
            && crc != 0
        {
            return Some(Self::Crc32(crc));
        }
        let token = file.checksum_type.as_deref()?;
        match get_checksum_generator(token, None) {
            Some(generator) => Some(Self::Typed {
                generator,
                checksum: file.checksum.as_deref(),
            }),
            None => {
                tracing::warn!(path = %file.path, checksum_type = token, "Unknown checksum type, not verifying");
                None
            }
        }
    }

    fn holds(&self, folder: &Path, path: &str) -> Result<bool> {
        match self {
            Self::Crc32(expected) => {
                let record = ChecksumGenerator::Crc32.checksum(folder, path)?;
                Ok(record.checksum == Digest::Crc32(*expected))
            }
            Self::Typed {
                generator,
                checksum,
            } => {
                let record = generator.checksum(folder, path)?;
                Ok(checksum.is_some_and(|expected| record.checksum.to_string() == expected))
            }
        }
    }
}

/// Recompute checksums of `files` under `folder` and compare them with the
/// registry's records for `dataset_id`.
///
/// Returns the paths whose checksum differs, in the order given; an empty
/// list means every file checked out. Files whose record carries no
/// checksum are skipped.
///
/// # Errors
///
/// A path the registry has no record for is [`Error::FileNotRecorded`]. A
/// path missing from `folder` is an I/O error from the checksum layer.
pub fn validate_checksum<R: Registry + ?Sized>(
    registry: &R,
    files: &[String],
    dataset_id: &str,
    folder: &Path,
) -> Result<Vec<String>> {
    let records = registry.search_files(dataset_id)?;
    let by_path: HashMap<&str, &RegistryFile> =
        records.iter().map(|r| (r.path.as_str(), r)).collect();

    let mut invalid = Vec::new();
    for path in files {
        let record = by_path
            .get(path.as_str())
            .ok_or_else(|| Error::FileNotRecorded {
                dataset: dataset_id.to_string(),
                path: path.clone(),
            })?;
        let Some(expectation) = Expectation::of(record) else {
            tracing::debug!(path = %path, "No registry checksum, skipping");
            continue;
        };
        if !expectation.holds(folder, path)? {
            tracing::warn!(dataset = dataset_id, path = %path, "Checksum mismatch");
            invalid.push(path.clone());
        }
    }

    tracing::info!(
        dataset = dataset_id,
        checked = files.len(),
        invalid = invalid.len(),
        "Validated checksums"
    );
    Ok(invalid)
}
