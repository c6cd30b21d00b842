use thiserror::Error;

use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::matching::MatchError;
use crate::report::ReportError;
use crate::source::SourceError;
use crate::storage::CacheError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where in a run a fatal error happened.
pub enum Stage {
    Configuration,
    Authentication,
    Reviewers,
    Submissions,
    ModelLoading,
    Matching,
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::Reviewers => "reviewer extraction",
            Self::Submissions => "submission extraction",
            Self::ModelLoading => "model loading",
            Self::Matching => "matching",
            Self::Report => "report",
        })
    }
}

#[derive(Debug, Error)]
/// A fatal run error. Nothing has been written to the output directory.
pub enum RunError {
    #[error("{stage} failed: {source}")]
    Config {
        stage: Stage,
        #[source]
        source: ConfigError,
    },

    #[error("{stage} failed: {source}")]
    Source {
        stage: Stage,
        #[source]
        source: SourceError,
    },

    #[error("{stage} failed: {source}")]
    Cache {
        stage: Stage,
        #[source]
        source: CacheError,
    },

    #[error("model loading failed: {0}")]
    Embedder(#[from] EmbeddingError),

    #[error("matching failed: {0}")]
    Match(#[from] MatchError),

    #[error("report failed: {0}")]
    Report(#[from] ReportError),
}

impl RunError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config { stage, .. } | Self::Source { stage, .. } | Self::Cache { stage, .. } => {
                *stage
            }
            Self::Embedder(_) => Stage::ModelLoading,
            Self::Match(_) => Stage::Matching,
            Self::Report(_) => Stage::Report,
        }
    }

    /// 1-based ID of the paper that failed, for matching errors.
    pub fn paper_id(&self) -> Option<usize> {
        match self {
            Self::Match(e) => e.paper_id(),
            _ => None,
        }
    }
}
