//! The closed set of checksum generators and the token factory

use std::path::Path;

use crate::annex::AnnexHashGenerator;
use crate::record::{ChecksumKind, ChecksumRecord};
use crate::{Result, crc32, hash, worm};

/// A checksum strategy.
#[derive(Debug, Clone)]
pub enum ChecksumGenerator {
    Crc32,
    Sha256,
    Md5,
    Worm,
    /// Digests taken from git-annex keys of one repository
    Delegated(AnnexHashGenerator),
}

impl ChecksumGenerator {
    /// Generator for a plain algorithm.
    pub fn for_kind(kind: ChecksumKind) -> Self {
        match kind {
            ChecksumKind::Crc32 => Self::Crc32,
            ChecksumKind::Sha256 => Self::Sha256,
            ChecksumKind::Md5 => Self::Md5,
            ChecksumKind::Worm => Self::Worm,
        }
    }

    /// Generator for a registry checksum-type token, `None` if unrecognized.
    pub fn from_token(token: &str) -> Option<Self> {
        token.parse::<ChecksumKind>().ok().map(Self::for_kind)
    }

    /// Compute the checksum of `root/relative`.
    ///
    /// `Delegated` ignores `root` and resolves `relative` against its own
    /// repository.
    pub fn checksum(&self, root: &Path, relative: &str) -> Result<ChecksumRecord> {
        match self {
            Self::Crc32 => crc32::checksum(root, relative),
            Self::Sha256 => hash::sha256(root, relative),
            Self::Md5 => hash::md5(root, relative),
            Self::Worm => worm::checksum(root, relative),
            Self::Delegated(annex) => annex.checksum(relative),
        }
    }
}

/// Pick the generator for `token`.
///
/// An unrecognized token yields `default` when one is given and `None`
/// otherwise; it never fails.
pub fn get_checksum_generator(
    token: &str,
    default: Option<ChecksumGenerator>,
) -> Option<ChecksumGenerator> {
    ChecksumGenerator::from_token(token).or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_resolve() {
        assert!(matches!(
            get_checksum_generator("SHA256", None),
            Some(ChecksumGenerator::Sha256)
        ));
        assert!(matches!(
            get_checksum_generator("MD5", None),
            Some(ChecksumGenerator::Md5)
        ));
        assert!(matches!(
            get_checksum_generator("WORM", None),
            Some(ChecksumGenerator::Worm)
        ));
    }

    #[test]
    fn unknown_token_without_default_is_none() {
        assert!(get_checksum_generator("BLAKE3", None).is_none());
    }

    #[test]
    fn unknown_token_with_default_returns_default() {
        let generator = get_checksum_generator("BLAKE3", Some(ChecksumGenerator::Crc32));
        assert!(matches!(generator, Some(ChecksumGenerator::Crc32)));
    }
}
