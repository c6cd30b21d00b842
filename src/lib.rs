//! Reviewer affinity library crate (used by the CLI and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by stage of a run:
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Run configuration
//! - [`ReviewerRecord`], [`SubmissionRecord`] - Extracted records
//! - [`RecordCache`] - Snapshot persistence between runs
//!
//! ## Extraction
//! - [`SourceAdapter`] - Contract for the conference management site
//! - [`PcsAdapter`] - HTTP/HTML implementation, [`NoSource`] for offline setups
//!
//! ## Embedding & Matching
//! - [`TextEmbedder`], [`SpecterEmbedder`], [`SpecterConfig`] - Document embeddings
//! - [`AffinityMatcher`], [`AffinityMatrix`] - Reviewer x paper distances
//!
//! ## Output
//! - [`ReportBuilder`], [`DistanceTable`], [`PaperIdIndex`] - CSV/JSON artifacts
//! - [`Pipeline`], [`RunError`], [`Stage`] - One end-to-end run
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod hashing;
pub mod matching;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod source;
pub mod storage;

pub use config::{Config, ConfigError};
pub use constants::{
    DISTANCE_MATRIX_FILENAME, DimValidationError, PAPER_INDEX_FILENAME,
    REVIEWERS_CACHE_FILENAME, SENTINEL, SUBMISSIONS_CACHE_FILENAME, validate_embedding_dim,
};
pub use embedding::{EmbeddingError, SpecterConfig, SpecterEmbedder, TextEmbedder};
pub use hashing::{OrderFingerprint, PaperIdDrift, detect_paper_id_drift, hash_to_u64};
pub use matching::{AffinityMatcher, AffinityMatrix, MatchError, euclidean_distance};
pub use pipeline::{Origin, Pipeline, RunError, RunSummary, Stage};
pub use records::{PotentialReviewer, Record, RecordKind, ReviewerRecord, SubmissionRecord};
pub use report::{DistanceRow, DistanceTable, PaperIdIndex, ReportBuilder, ReportError, ReportPaths};
pub use source::{
    Credentials, NoSource, PcsAdapter, Session, SourceAdapter, SourceError, SubmissionHandle,
};
#[cfg(any(test, feature = "mock"))]
pub use source::{MockCalls, MockSourceAdapter};
pub use storage::{CacheError, RecordCache, StorageError};
