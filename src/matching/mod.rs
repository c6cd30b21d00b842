//! Reviewer × paper distance computation.
//!
//! Reviewer profiles are embedded once, in a single batch, and reused for every paper.
//! Each paper is then embedded on its own and compared against all reviewers. There is
//! no normalization and no pruning: every entry is the raw Euclidean distance between
//! two embeddings.

pub mod error;
pub mod matrix;


pub use error::MatchError;
pub use matrix::{AffinityMatrix, euclidean_distance};

use tracing::{debug, info, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::{EmbeddingError, TextEmbedder};
use crate::records::{ReviewerRecord, SubmissionRecord};

/// Computes [`AffinityMatrix`]es with a borrowed or owned embedder.
pub struct AffinityMatcher<E> {
    embedder: E,
    expert_only: bool,
}

impl<E: TextEmbedder> std::fmt::Debug for AffinityMatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityMatcher")
            .field("embedding_dim", &self.embedder.embedding_dim())
            .field("separator", &self.embedder.separator())
            .field("expert_only", &self.expert_only)
            .finish()
    }
}

impl<E: TextEmbedder> AffinityMatcher<E> {
    pub fn new(embedder: E, expert_only: bool) -> Self {
        Self {
            embedder,
            expert_only,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Reviewer texts in load order, as fed to the embedder.
    pub fn reviewer_texts(&self, reviewers: &[ReviewerRecord]) -> Vec<String> {
        let sep = self.embedder.separator();
        reviewers
            .iter()
            .map(|r| r.embedding_text(sep, self.expert_only))
            .collect()
    }

    /// Embeds every reviewer profile in one call.
    pub fn embed_reviewers(&self, reviewers: &[ReviewerRecord]) -> Result<Vec<Vec<f32>>, MatchError> {
        if reviewers.is_empty() {
            return Ok(Vec::new());
        }

        for (idx, reviewer) in reviewers.iter().enumerate() {
            if reviewer.is_blank(self.expert_only) {
                warn!(reviewer = idx + 1, "Reviewer profile has no name or keywords");
            }
        }

        let texts = self.reviewer_texts(reviewers);
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let vectors = self
            .embedder
            .embed(&refs)
            .map_err(|source| MatchError::Reviewers { source })?;

        if vectors.len() != reviewers.len() {
            return Err(MatchError::Reviewers {
                source: EmbeddingError::OutputCountMismatch {
                    expected: reviewers.len(),
                    actual: vectors.len(),
                },
            });
        }

        let expected = self.embedder.embedding_dim();
        for (idx, vector) in vectors.iter().enumerate() {
            validate_embedding_dim(vector.len(), expected).map_err(|source| {
                MatchError::ReviewerDimension {
                    reviewer: idx + 1,
                    source,
                }
            })?;
        }

        debug!(reviewers = vectors.len(), "Reviewer embeddings ready");
        Ok(vectors)
    }

    /// Embeds one paper. `index` is its 0-based position in processing order.
    fn embed_paper(&self, index: usize, submission: &SubmissionRecord) -> Result<Vec<f32>, MatchError> {
        let paper_id = index + 1;
        let paper_error = |source| MatchError::Paper {
            paper_id,
            title: submission.title.clone(),
            source,
        };

        if !submission.has_content() {
            return Err(paper_error(EmbeddingError::EmptyInput { index }));
        }

        let text = submission.embedding_text(self.embedder.separator());
        let vector = self
            .embedder
            .embed(&[text.as_str()])
            .map_err(paper_error)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                paper_error(EmbeddingError::OutputCountMismatch {
                    expected: 1,
                    actual: 0,
                })
            })?;

        validate_embedding_dim(vector.len(), self.embedder.embedding_dim())
            .map_err(|source| MatchError::PaperDimension { paper_id, source })?;
        Ok(vector)
    }

    /// Builds the full `reviewers.len() × submissions.len()` matrix.
    ///
    /// Column `i` holds paper ID `i + 1`. The first paper that cannot be embedded
    /// aborts the computation with its ID.
    pub fn compute_matrix(
        &self,
        reviewers: &[ReviewerRecord],
        submissions: &[SubmissionRecord],
    ) -> Result<AffinityMatrix, MatchError> {
        let total = submissions.len();
        info!(reviewers = reviewers.len(), papers = total, "Computing affinity matrix");

        let reviewer_vectors = self.embed_reviewers(reviewers)?;
        let mut matrix = AffinityMatrix::new(reviewers.len(), total);

        for (index, submission) in submissions.iter().enumerate() {
            let paper_id = index + 1;
            let paper_vector = self.embed_paper(index, submission)?;

            let mut column = Vec::with_capacity(reviewer_vectors.len());
            for (reviewer, reviewer_vector) in reviewer_vectors.iter().enumerate() {
                let distance = euclidean_distance(reviewer_vector, &paper_vector);
                if !distance.is_finite() {
                    return Err(MatchError::NonFinite {
                        reviewer: reviewer + 1,
                        paper_id,
                    });
                }
                column.push(distance);
            }

            matrix.set_column(index, &column);
            info!(paper_id, total, "Paper {}/{} processed", paper_id, total);
        }

        Ok(matrix)
    }
}
