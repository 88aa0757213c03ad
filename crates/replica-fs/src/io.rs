//! Whole-file reads and crash-safe writes

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Replace `path` with `content` so readers see either the old or the new
/// bytes, never a mix.
///
/// The bytes go to a hidden sibling first (held under an exclusive advisory
/// lock while written and synced), then the sibling is renamed over `path`.
/// Missing parent directories are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();
    ensure_parent(&target)?;

    let staging = staging_path(&target);
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staging)
        .map_err(|e| Error::io(&staging, e))?;
    if let Err(err) = fill_locked(file, &staging, &target, content) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }

    fs::rename(&staging, &target).map_err(|e| Error::io(&target, e))?;
    tracing::debug!(path = %path, bytes = content.len(), "Replaced file");
    Ok(())
}

fn ensure_parent(target: &Path) -> Result<()> {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.partial", std::process::id()))
}

fn fill_locked(mut file: File, staging: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let lock_failed = |_| Error::LockFailed {
        path: target.to_path_buf(),
    };
    file.lock_exclusive().map_err(lock_failed)?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io(staging, e))?;
    FileExt::unlock(&file).map_err(lock_failed)
}

/// Read a UTF-8 file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(native, e))
}

pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Add `line` at the end of a text file, creating the file if needed.
///
/// Existing content without a final newline gets one before `line`.
pub fn append_line(path: &NormalizedPath, line: &str) -> Result<()> {
    let mut content = if path.exists() {
        read_text(path)?
    } else {
        String::new()
    };
    if content.chars().last().is_some_and(|c| c != '\n') {
        content.push('\n');
    }
    content.extend([line, "\n"]);
    write_text(path, &content)
}
