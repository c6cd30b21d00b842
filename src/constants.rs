//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! Reviewer and paper embeddings must come from the same encoder. The matcher checks
//! every paper vector against the reviewer batch with [`validate_embedding_dim`] rather
//! than trusting the configured [`DEFAULT_EMBEDDING_DIM`].

/// Hidden size of the SPECTER2 base encoder.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Token budget per input; longer inputs are truncated, never rejected.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Separator inserted between template fields (BERT `[SEP]`).
pub const DEFAULT_SEP_TOKEN: &str = "[SEP]";

/// Placeholder for fields the source site did not provide.
pub const SENTINEL: &str = "N/A";

pub const DEFAULT_CONFERENCE_NAME: &str = "CHI 2025";

pub const DEFAULT_ADAPTER_NAME: &str = "specter2_adhoc_query";

pub const REVIEWERS_CACHE_FILENAME: &str = "reviewers.txt";
pub const SUBMISSIONS_CACHE_FILENAME: &str = "submissions.txt";

pub const DISTANCE_MATRIX_FILENAME: &str = "reviewer_distance_matrix.csv";
pub const PAPER_INDEX_FILENAME: &str = "paper_id_to_title.json";

/// Error returned when two embeddings disagree on dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use affinity::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// let paper_dim = 768;
/// validate_embedding_dim(paper_dim, DEFAULT_EMBEDDING_DIM).unwrap();
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
