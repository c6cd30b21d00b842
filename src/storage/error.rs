use std::path::PathBuf;

use thiserror::Error;

use crate::records::RecordKind;

#[derive(Error, Debug)]
/// Errors raised while replacing a file on disk.
pub enum StorageError {
    /// The target directory could not be prepared.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be written or moved into place.
    #[error("write failed for {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
/// Errors returned by [`RecordCache`](super::RecordCache).
pub enum CacheError {
    /// No snapshot exists and the caller forbids live extraction.
    #[error("no {kind} snapshot at {path} (live extraction disabled)")]
    Miss { kind: RecordKind, path: PathBuf },

    /// The snapshot exists but could not be read.
    #[error("failed to read {kind} snapshot at {path}: {source}")]
    Read {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not a JSON array of records.
    #[error("{kind} snapshot at {path} is corrupt: {source}")]
    Corrupt {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be encoded.
    #[error("failed to encode {kind} snapshot: {source}")]
    Encode {
        kind: RecordKind,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
