use thiserror::Error;

use crate::constants::DimValidationError;
use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("embedding reviewer profiles failed: {source}")]
    Reviewers {
        #[source]
        source: EmbeddingError,
    },

    /// Embedding one paper failed. `paper_id` is the 1-based column index.
    #[error("paper {paper_id} ('{title}') failed: {source}")]
    Paper {
        paper_id: usize,
        title: String,
        #[source]
        source: EmbeddingError,
    },

    #[error("paper {paper_id}: {source}")]
    PaperDimension {
        paper_id: usize,
        #[source]
        source: DimValidationError,
    },

    #[error("reviewer {reviewer}: {source}")]
    ReviewerDimension {
        reviewer: usize,
        #[source]
        source: DimValidationError,
    },

    #[error("non-finite distance between reviewer {reviewer} and paper {paper_id}")]
    NonFinite { reviewer: usize, paper_id: usize },
}

impl MatchError {
    /// 1-based paper ID the error belongs to, if it is paper-specific.
    pub fn paper_id(&self) -> Option<usize> {
        match self {
            Self::Paper { paper_id, .. }
            | Self::PaperDimension { paper_id, .. }
            | Self::NonFinite { paper_id, .. } => Some(*paper_id),
            Self::Reviewers { .. } | Self::ReviewerDimension { .. } => None,
        }
    }
}
