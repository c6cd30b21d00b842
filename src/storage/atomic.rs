use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::StorageError;

/// Replaces `path` with `bytes` via a synced temp file in the same directory.
///
/// Readers see either the previous contents or the new contents, never a partial
/// write. An interrupted write leaves only an orphaned temp file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    write_atomic_all(&[(path, bytes)])
}

/// Replaces several files together.
///
/// Every temp file is written and synced, and every target checked, before the
/// first rename. A failure up to that point leaves all targets untouched.
pub fn write_atomic_all(files: &[(&Path, &[u8])]) -> Result<(), StorageError> {
    let mut staged = Vec::with_capacity(files.len());
    for &(path, bytes) in files {
        staged.push((path, stage(path, bytes)?));
    }

    for (path, _) in &staged {
        if path.is_dir() {
            return Err(StorageError::WriteFailed {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::IsADirectory, "target is a directory"),
            });
        }
    }

    for (path, temp) in staged {
        temp.persist(path).map_err(|e| StorageError::WriteFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    }

    Ok(())
}

/// Writes `bytes` to a synced temp file next to `path`.
fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, StorageError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let write_failed = |source| StorageError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    temp.write_all(bytes).map_err(write_failed)?;
    temp.as_file().sync_all().map_err(write_failed)?;
    Ok(temp)
}
