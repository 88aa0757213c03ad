//! Manifest command implementation

use std::io::{self, Write};
use std::path::Path;

use replica_core::{ContentIndex, Settings};
use replica_git::GitRepository;

use crate::error::Result;

/// Print one JSON object per tracked file.
pub fn run_manifest(repository: &Path, crc32: bool) -> Result<()> {
    let repo = GitRepository::discover(repository)?;
    let settings = Settings::load(Some(repo.root().to_native().as_path()))?;
    let use_annex_hash = !crc32 && settings.git_annex_hash_as_checksum;
    let index = ContentIndex::new(&repo, use_annex_hash)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for file in index.files()? {
        let file = file?;
        serde_json::to_writer(&mut out, &file)?;
        writeln!(out)?;
    }
    Ok(())
}
