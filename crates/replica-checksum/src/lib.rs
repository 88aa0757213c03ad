//! Checksum algorithm family for dataset replicas
//!
//! Computes `{checksum, checksumType, fileLength, path}` records for files
//! inside a repository. The family is closed: [`ChecksumGenerator`] has one
//! variant per algorithm plus [`ChecksumGenerator::Delegated`], which reads
//! digests out of git-annex keys.
//!
//! ```text
//! ChecksumGenerator
//!   ├── Crc32      (external `cksum`)
//!   ├── Sha256     (streamed, 4 KiB chunks)
//!   ├── Md5        (streamed, 4 KiB chunks)
//!   ├── Worm       (size + mtime + path, no content)
//!   └── Delegated  (annex key, falls back per file)
//! ```

pub mod annex;
pub mod crc32;
pub mod error;
pub mod generator;
pub mod hash;
pub mod record;
pub mod worm;

pub use annex::AnnexHashGenerator;
pub use error::{Error, Result};
pub use generator::{ChecksumGenerator, get_checksum_generator};
pub use record::{ChecksumKind, ChecksumRecord, Digest};
