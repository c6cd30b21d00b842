use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Matrix shape disagrees with the record collections it is reported against.
    #[error("matrix is {actual:?} but records are {expected:?} (reviewers, papers)")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer could not be flushed: {reason}")]
    CsvFlush { reason: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
