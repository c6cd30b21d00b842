//! One run, end to end.
//!
//! 1. Reviewers: the snapshot if one exists, otherwise live extraction (then cached).
//! 2. Submissions: the snapshot unless a refresh is forced, otherwise live extraction
//!    (then cached, overwriting the old snapshot).
//! 3. Matching over both collections.
//! 4. Both artifacts written to the output directory.
//!
//! The source is only contacted, and only logged into, when a dataset actually needs
//! live extraction. Any error before step 4 leaves the output directory untouched.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{RunError, Stage};

use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::embedding::TextEmbedder;
use crate::hashing::{PaperIdDrift, detect_paper_id_drift};
use crate::matching::AffinityMatcher;
use crate::records::{ReviewerRecord, SubmissionRecord};
use crate::report::{ReportBuilder, ReportPaths};
use crate::source::{Session, SourceAdapter};
use crate::storage::{CacheError, RecordCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a dataset came from in this run.
pub enum Origin {
    Snapshot,
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reviewers: usize,
    pub papers: usize,
    pub reviewer_origin: Origin,
    pub submission_origin: Origin,
    /// Set when a refreshed submission snapshot renumbered previously issued paper IDs.
    pub drift: Option<PaperIdDrift>,
    /// Paper IDs whose submission page never loaded (title and abstract are `N/A`).
    pub placeholder_papers: Vec<usize>,
    pub paths: ReportPaths,
}

/// Drives one run against a source adapter and an embedder.
pub struct Pipeline<'a, A, E> {
    config: &'a Config,
    cache: RecordCache,
    source: A,
    matcher: AffinityMatcher<E>,
    report: ReportBuilder,
    session: Option<Session>,
}

impl<'a, A: SourceAdapter, E: TextEmbedder> Pipeline<'a, A, E> {
    pub fn new(config: &'a Config, source: A, embedder: E) -> Self {
        Self {
            config,
            cache: RecordCache::new(&config.cache_dir),
            source,
            matcher: AffinityMatcher::new(embedder, config.expert_only),
            report: ReportBuilder::new(&config.output_dir),
            session: None,
        }
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    fn ensure_session(&mut self) -> Result<(), RunError> {
        if self.session.is_some() {
            return Ok(());
        }

        let credentials = self
            .config
            .credentials
            .as_ref()
            .ok_or(RunError::Config {
                stage: Stage::Authentication,
                source: ConfigError::MissingEnvVar {
                    name: Config::ENV_USERNAME,
                },
            })?;

        let session = self
            .source
            .authenticate(credentials)
            .map_err(|source| RunError::Source {
                stage: Stage::Authentication,
                source,
            })?;
        self.session = Some(session);
        Ok(())
    }

    /// Cached reviewers if present; otherwise extracts and caches them.
    pub fn load_reviewers(&mut self) -> Result<(Vec<ReviewerRecord>, Origin), RunError> {
        let cache_error = |source| RunError::Cache {
            stage: Stage::Reviewers,
            source,
        };

        if let Some(reviewers) = self.cache.load::<ReviewerRecord>().map_err(cache_error)? {
            return Ok((reviewers, Origin::Snapshot));
        }

        if self.config.offline {
            let reviewers = self.cache.require::<ReviewerRecord>().map_err(cache_error)?;
            return Ok((reviewers, Origin::Snapshot));
        }

        self.ensure_session()?;
        let reviewers = self
            .source
            .list_reviewers()
            .map_err(|source| RunError::Source {
                stage: Stage::Reviewers,
                source,
            })?;
        info!(count = reviewers.len(), "Reviewers extracted");

        self.cache.store(&reviewers).map_err(cache_error)?;
        Ok((reviewers, Origin::Live))
    }

    /// Cached submissions unless a refresh is forced; otherwise extracts and caches them.
    pub fn load_submissions(
        &mut self,
    ) -> Result<(Vec<SubmissionRecord>, Origin, Option<PaperIdDrift>), RunError> {
        let cache_error = |source| RunError::Cache {
            stage: Stage::Submissions,
            source,
        };

        let previous = match self.cache.load::<SubmissionRecord>() {
            Ok(previous) => previous,
            Err(CacheError::Corrupt { path, source, .. })
                if self.config.force_refresh_submissions && !self.config.offline =>
            {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "Submission snapshot is corrupt, replacing it with a live extraction"
                );
                None
            }
            Err(e) => return Err(cache_error(e)),
        };

        if self.config.offline {
            if self.config.force_refresh_submissions {
                warn!("Offline run: ignoring forced submission refresh");
            }
            let submissions = match previous {
                Some(submissions) => submissions,
                None => self.cache.require::<SubmissionRecord>().map_err(cache_error)?,
            };
            return Ok((submissions, Origin::Snapshot, None));
        }

        let previous = match previous {
            Some(submissions) if !self.config.force_refresh_submissions => {
                return Ok((submissions, Origin::Snapshot, None));
            }
            other => other,
        };

        self.ensure_session()?;
        let submissions = self
            .source
            .list_submissions()
            .map_err(|source| RunError::Source {
                stage: Stage::Submissions,
                source,
            })?;
        info!(count = submissions.len(), "Submissions extracted");

        let drift = previous
            .as_deref()
            .and_then(|old| detect_paper_id_drift(old, &submissions));
        if let Some(ref drift) = drift {
            warn!(
                previous = %drift.previous,
                current = %drift.current,
                first_changed = ?drift.first_changed,
                previous_count = drift.previous_count,
                current_count = drift.current_count,
                "Submission order changed: paper IDs from earlier runs no longer match"
            );
        }

        self.cache.store(&submissions).map_err(cache_error)?;
        Ok((submissions, Origin::Live, drift))
    }

    /// Runs all stages and writes the artifacts.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        let (reviewers, reviewer_origin) = self.load_reviewers()?;
        info!(count = reviewers.len(), origin = ?reviewer_origin, "Reviewers ready");

        let (submissions, submission_origin, drift) = self.load_submissions()?;
        info!(count = submissions.len(), origin = ?submission_origin, "Submissions ready");
        let placeholder_papers = placeholder_papers(&submissions);
        if !placeholder_papers.is_empty() {
            warn!(
                paper_ids = ?placeholder_papers,
                origin = ?submission_origin,
                "Submissions without title or abstract are matched as N/A; \
                 force a submission refresh to retry their pages"
            );
        }

        let matrix = self.matcher.compute_matrix(&reviewers, &submissions)?;
        let (table, index) = self.report.build(&matrix, &reviewers, &submissions)?;
        let paths = self.report.write(&table, &index)?;

        Ok(RunSummary {
            reviewers: reviewers.len(),
            papers: submissions.len(),
            reviewer_origin,
            submission_origin,
            drift,
            placeholder_papers,
            paths,
        })
    }
}

/// 1-based IDs of submissions whose page yielded neither title nor abstract.
fn placeholder_papers(submissions: &[SubmissionRecord]) -> Vec<usize> {
    submissions
        .iter()
        .enumerate()
        .filter(|(_, submission)| submission.is_placeholder())
        .map(|(idx, _)| idx + 1)
        .collect()
}
