//! git-annex backends, keys and the repo-local attributes file
//!
//! The attributes file (`.git/info/attributes`) carries one load-bearing
//! line, `* annex.backend=<NAME>`, which fixes how annex names file content
//! for the lifetime of the repository.

use std::fmt;
use std::str::FromStr;

use replica_fs::{NormalizedPath, io};
use serde::Deserialize;

use crate::{Error, Result};

/// Attributes file copied into every repository at extension-init.
pub const ATTRIBUTES_TEMPLATE: &str = include_str!("../templates/annex-attributes");

const BACKEND_ATTRIBUTE: &str = "annex.backend";

/// git-annex backends with a digest extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnexBackend {
    Sha256,
    /// SHA-256 with the file extension appended to the key
    Sha256E,
    Md5,
    /// MD5 with the file extension appended to the key
    Md5E,
    /// Write-once-read-many: size and mtime, no content hash
    Worm,
}

impl AnnexBackend {
    pub const ALL: [AnnexBackend; 5] = [
        Self::Sha256E,
        Self::Sha256,
        Self::Md5E,
        Self::Md5,
        Self::Worm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha256E => "SHA256E",
            Self::Md5 => "MD5",
            Self::Md5E => "MD5E",
            Self::Worm => "WORM",
        }
    }

    /// Whether keys of this backend embed a content digest.
    pub fn is_content_hash(&self) -> bool {
        !matches!(self, Self::Worm)
    }

    /// Whether keys of this backend carry the file extension after the digest.
    pub fn keeps_extension(&self) -> bool {
        matches!(self, Self::Sha256E | Self::Md5E)
    }

    /// Hex length of the embedded digest, `None` for WORM.
    fn digest_len(&self) -> Option<usize> {
        match self {
            Self::Sha256 | Self::Sha256E => Some(64),
            Self::Md5 | Self::Md5E => Some(32),
            Self::Worm => None,
        }
    }
}

impl FromStr for AnnexBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "SHA256" => Ok(Self::Sha256),
            "SHA256E" => Ok(Self::Sha256E),
            "MD5" => Ok(Self::Md5),
            "MD5E" => Ok(Self::Md5E),
            "WORM" => Ok(Self::Worm),
            other => Err(Error::UnsupportedBackend {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AnnexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed git-annex key such as `SHA256E-s1048576--9f86...08.bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnexKey {
    pub backend: AnnexBackend,
    pub size: Option<u64>,
    pub mtime: Option<i64>,
    digest: String,
}

impl AnnexKey {
    /// Parse a key string.
    ///
    /// Hash backends yield the hex digest between the `--` separator and the
    /// extension marker. WORM keys yield everything after the `WORM-` prefix,
    /// which is the `s<size>-m<mtime>--<name>` identity.
    pub fn parse(key: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidKey {
            key: key.to_string(),
            message: message.to_string(),
        };

        let (fields, name) = key
            .split_once("--")
            .ok_or_else(|| invalid("missing '--' separator"))?;
        let mut parts = fields.split('-');
        let backend_name = parts.next().unwrap_or_default();
        let backend = backend_name.parse::<AnnexBackend>()?;

        let mut size = None;
        let mut mtime = None;
        for field in parts {
            if let Some(value) = field.strip_prefix('s') {
                size = Some(value.parse().map_err(|_| invalid("bad size field"))?);
            } else if let Some(value) = field.strip_prefix('m') {
                mtime = Some(value.parse().map_err(|_| invalid("bad mtime field"))?);
            }
        }

        let digest = match backend.digest_len() {
            Some(expected) => {
                let digest = if backend.keeps_extension() {
                    name.split('.').next().unwrap_or_default()
                } else {
                    name
                };
                if digest.len() != expected || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(invalid("digest is not a hex string of the expected length"));
                }
                digest.to_ascii_lowercase()
            }
            None => {
                let identity = &key[backend_name.len() + 1..];
                if size.is_none() || mtime.is_none() {
                    return Err(invalid("WORM key without size and mtime"));
                }
                identity.to_string()
            }
        };

        Ok(Self {
            backend,
            size,
            mtime,
            digest,
        })
    }

    /// The checksum carried by the key.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Subset of `git annex info --json` for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnexFileInfo {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub present: bool,
    #[serde(default)]
    pub file: Option<String>,
}

/// Decode `annex info --json` output.
pub fn decode_annex_info(output: &str) -> Result<AnnexFileInfo> {
    let line = output
        .lines()
        .find(|line| line.trim_start().starts_with('{'))
        .ok_or_else(|| Error::decode("annex info", "no JSON object in output", output))?;
    serde_json::from_str(line).map_err(|e| Error::decode("annex info", e.to_string(), output))
}

/// Produce attributes file content, pinning `backend` when given.
pub fn render_attributes(backend: Option<AnnexBackend>) -> String {
    let Some(backend) = backend else {
        return ATTRIBUTES_TEMPLATE.to_string();
    };
    ATTRIBUTES_TEMPLATE
        .lines()
        .map(|line| {
            if line.contains(BACKEND_ATTRIBUTE) {
                format!("* {}={}", BACKEND_ATTRIBUTE, backend)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

/// Read the raw backend name from an attributes file.
///
/// Returns `None` when the file or the backend line is absent.
pub fn read_backend_name(attributes: &NormalizedPath) -> Result<Option<String>> {
    if !attributes.is_file() {
        return Ok(None);
    }
    let content = io::read_text(attributes)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .find_map(|line| {
            let (_, value) = line.split_once(&format!("{BACKEND_ATTRIBUTE}="))?;
            value.split_whitespace().next().map(str::to_string)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SHA: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn sha256e_key_strips_extension() {
        let key = AnnexKey::parse(&format!("SHA256E-s4--{SHA}.bin")).unwrap();
        assert_eq!(key.backend, AnnexBackend::Sha256E);
        assert_eq!(key.size, Some(4));
        assert_eq!(key.digest(), SHA);
    }

    #[test]
    fn sha256e_key_with_double_extension() {
        let key = AnnexKey::parse(&format!("SHA256E-s4--{SHA}.tar.gz")).unwrap();
        assert_eq!(key.digest(), SHA);
    }

    #[test]
    fn md5_key_without_extension() {
        let key = AnnexKey::parse("MD5-s3--acbd18db4cc2f85cedef654fccc4a4d8").unwrap();
        assert_eq!(key.digest(), "acbd18db4cc2f85cedef654fccc4a4d8");
    }

    #[test]
    fn worm_key_strips_prefix() {
        let key = AnnexKey::parse("WORM-s1024-m1600000000--data/big_file").unwrap();
        assert_eq!(key.backend, AnnexBackend::Worm);
        assert_eq!(key.mtime, Some(1_600_000_000));
        assert_eq!(key.digest(), "s1024-m1600000000--data/big_file");
    }

    #[rstest]
    #[case("SHA256E-s4")]
    #[case("SHA256E-s4--nothex.bin")]
    #[case("SHA256-sX--9f86")]
    #[case("WORM--name")]
    fn malformed_keys_are_rejected(#[case] key: &str) {
        assert!(matches!(
            AnnexKey::parse(key),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn unknown_backend_is_unsupported() {
        let err = AnnexKey::parse("BLAKE2B256-s4--abcd").unwrap_err();
        assert!(matches!(err, Error::UnsupportedBackend { name } if name == "BLAKE2B256"));
    }

    #[test]
    fn render_pins_backend_line() {
        let content = render_attributes(Some(AnnexBackend::Worm));
        assert!(content.lines().any(|l| l == "* annex.backend=WORM"));
        assert!(!content.contains("SHA256E"));
        assert!(content.contains("annex.largefiles"));
    }

    #[test]
    fn read_backend_from_rendered_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("attributes"));
        io::write_text(&path, &render_attributes(Some(AnnexBackend::Md5))).unwrap();

        assert_eq!(read_backend_name(&path).unwrap().as_deref(), Some("MD5"));
    }

    #[test]
    fn missing_attributes_file_has_no_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("attributes"));
        assert_eq!(read_backend_name(&path).unwrap(), None);
    }

    #[test]
    fn annex_info_json_decodes() {
        let output = format!(
            r#"{{"command":"info","file":"x.bin","key":"SHA256E-s4--{SHA}.bin","present":true,"success":true}}"#
        );
        let info = decode_annex_info(&output).unwrap();
        assert!(info.present);
        assert_eq!(info.file.as_deref(), Some("x.bin"));
    }

    #[test]
    fn annex_info_without_json_is_decode_error() {
        assert!(matches!(
            decode_annex_info("git-annex: oops"),
            Err(Error::Decode { .. })
        ));
    }
}
