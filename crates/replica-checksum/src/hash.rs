//! Streamed cryptographic digests (SHA-256, MD5)
//!
//! Files are read in fixed 4096-byte chunks so peak memory does not depend on
//! file size.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest as _, Sha256};

use crate::record::{ChecksumKind, ChecksumRecord, Digest};
use crate::{Error, Result};

/// Read size for streamed hashing.
pub const CHUNK_SIZE: usize = 4096;

/// Hash `path` with `D`, returning the lowercase hex digest and byte count.
pub fn stream_digest<D: sha2::Digest>(path: &Path) -> Result<(String, u64)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    digest_reader::<D>(file, path)
}

/// Hash everything `reader` yields; `path` only labels errors.
///
/// Reads interrupted by a signal are retried.
pub fn digest_reader<D: sha2::Digest>(mut reader: impl Read, path: &Path) -> Result<(String, u64)> {
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(path, e)),
        };
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((hex::encode(hasher.finalize()), total))
}

/// SHA-256 of `root/relative`.
pub fn sha256(root: &Path, relative: &str) -> Result<ChecksumRecord> {
    let (hex, length) = stream_digest::<Sha256>(&root.join(relative))?;
    Ok(record(ChecksumKind::Sha256, hex, length, relative))
}

/// MD5 of `root/relative`.
pub fn md5(root: &Path, relative: &str) -> Result<ChecksumRecord> {
    let (hex, length) = stream_digest::<Md5>(&root.join(relative))?;
    Ok(record(ChecksumKind::Md5, hex, length, relative))
}

fn record(kind: ChecksumKind, hex: String, length: u64, relative: &str) -> ChecksumRecord {
    ChecksumRecord {
        kind,
        checksum: Digest::Text(hex),
        file_length: length,
        path: relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::Digest as _;

    #[test]
    fn sha256_known_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello world").unwrap();

        let record = sha256(dir.path(), "hello.txt").unwrap();

        assert_eq!(
            record.checksum,
            Digest::Text("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9".into())
        );
        assert_eq!(record.file_length, 11);
    }

    #[test]
    fn md5_known_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo"), "foo").unwrap();

        let record = md5(dir.path(), "foo").unwrap();

        assert_eq!(
            record.checksum,
            Digest::Text("acbd18db4cc2f85cedef654fccc4a4d8".into())
        );
    }

    #[test]
    fn streaming_crosses_chunk_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("big.bin"), &content).unwrap();

        let record = sha256(dir.path(), "big.bin").unwrap();

        assert_eq!(
            record.checksum,
            Digest::Text(format!("{:x}", Sha256::digest(&content)))
        );
        assert_eq!(record.file_length, content.len() as u64);
    }

    /// Yields `ErrorKind::Interrupted` before every chunk it serves.
    struct InterruptingReader<'a> {
        bytes: &'a [u8],
        interrupt_next: bool,
    }

    impl Read for InterruptingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.interrupt_next {
                self.interrupt_next = false;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.interrupt_next = true;
            self.bytes.read(buf)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let content: Vec<u8> = (0..(CHUNK_SIZE * 2 + 5)).map(|i| (i % 13) as u8).collect();
        let reader = InterruptingReader {
            bytes: &content,
            interrupt_next: true,
        };

        let (hex, length) = digest_reader::<Sha256>(reader, Path::new("flaky")).unwrap();

        assert_eq!(hex, format!("{:x}", Sha256::digest(&content)));
        assert_eq!(length, content.len() as u64);
    }
}
