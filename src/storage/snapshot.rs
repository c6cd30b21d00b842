use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::atomic::write_atomic;
use super::error::{CacheError, CacheResult};
use crate::records::Record;

#[derive(Debug, Clone)]
/// Persists extracted record collections as pretty-printed JSON snapshots.
///
/// Each [`RecordKind`](crate::records::RecordKind) maps to one file in `dir`. Snapshots
/// are overwritten whole; there is no merging with live data.
pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `R`.
    pub fn snapshot_path<R: Record>(&self) -> PathBuf {
        self.dir.join(R::KIND.cache_filename())
    }

    /// Returns `true` if a snapshot for `R` exists.
    pub fn exists<R: Record>(&self) -> bool {
        self.snapshot_path::<R>().is_file()
    }

    /// Returns the last stored snapshot, or `None` if there is none.
    pub fn load<R: Record>(&self) -> CacheResult<Option<Vec<R>>> {
        let path = self.snapshot_path::<R>();
        if !path.is_file() {
            debug!(kind = %R::KIND, path = %path.display(), "No snapshot on disk");
            return Ok(None);
        }

        let text = fs::read_to_string(&path).map_err(|source| CacheError::Read {
            kind: R::KIND,
            path: path.clone(),
            source,
        })?;

        let records: Vec<R> =
            serde_json::from_str(&text).map_err(|source| CacheError::Corrupt {
                kind: R::KIND,
                path: path.clone(),
                source,
            })?;

        info!(
            kind = %R::KIND,
            count = records.len(),
            path = %path.display(),
            "Loaded snapshot"
        );
        Ok(Some(records))
    }

    /// Like [`load`](Self::load) but a missing snapshot is a [`CacheError::Miss`].
    pub fn require<R: Record>(&self) -> CacheResult<Vec<R>> {
        self.load::<R>()?.ok_or_else(|| CacheError::Miss {
            kind: R::KIND,
            path: self.snapshot_path::<R>(),
        })
    }

    /// Atomically replaces the snapshot for `R`.
    pub fn store<R: Record>(&self, records: &[R]) -> CacheResult<()> {
        let path = self.snapshot_path::<R>();
        let json = serde_json::to_string_pretty(records).map_err(|source| CacheError::Encode {
            kind: R::KIND,
            source,
        })?;

        write_atomic(&path, json.as_bytes())?;

        info!(
            kind = %R::KIND,
            count = records.len(),
            path = %path.display(),
            "Stored snapshot"
        );
        Ok(())
    }
}
