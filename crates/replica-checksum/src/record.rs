//! Checksum records as exchanged with the registry

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Algorithm that produced a checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecksumKind {
    #[serde(rename = "CRC32")]
    Crc32,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "WORM")]
    Worm,
}

impl ChecksumKind {
    /// Registry token for this algorithm.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Sha256 => "SHA256",
            Self::Md5 => "MD5",
            Self::Worm => "WORM",
        }
    }
}

impl FromStr for ChecksumKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRC32" => Ok(Self::Crc32),
            "SHA256" => Ok(Self::Sha256),
            "MD5" => Ok(Self::Md5),
            "WORM" => Ok(Self::Worm),
            other => Err(format!("unknown checksum type: {other}")),
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A checksum value: CRC32 is numeric, everything else is text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Digest {
    Crc32(u32),
    Text(String),
}

impl Digest {
    pub fn as_crc32(&self) -> Option<u32> {
        match self {
            Self::Crc32(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Crc32(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One computed checksum. Computed fresh every time, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    #[serde(rename = "checksumType")]
    pub kind: ChecksumKind,
    pub checksum: Digest,
    #[serde(rename = "fileLength")]
    pub file_length: u64,
    /// Repository-relative path, forward slashes
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_registry_field_names() {
        let record = ChecksumRecord {
            kind: ChecksumKind::Crc32,
            checksum: Digest::Crc32(3_015_617_425),
            file_length: 6,
            path: "a.txt".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["checksumType"], "CRC32");
        assert_eq!(json["checksum"], 3_015_617_425u64);
        assert_eq!(json["fileLength"], 6);
    }

    #[test]
    fn kind_tokens_round_trip() {
        for kind in [
            ChecksumKind::Crc32,
            ChecksumKind::Sha256,
            ChecksumKind::Md5,
            ChecksumKind::Worm,
        ] {
            assert_eq!(kind.token().parse::<ChecksumKind>().unwrap(), kind);
        }
        assert!("sha256".parse::<ChecksumKind>().is_err());
    }
}
