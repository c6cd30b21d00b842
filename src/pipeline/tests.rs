use super::*;
use tempfile::TempDir;

use crate::embedding::{EmbeddingError, SpecterConfig, SpecterEmbedder};
use crate::matching::MatchError;
use crate::source::{Credentials, MockSourceAdapter, SourceError};
use crate::storage::CacheError;

fn config(dir: &TempDir) -> Config {
    Config {
        credentials: Some(Credentials::new("chair", "secret")),
        cache_dir: dir.path().join("cache"),
        output_dir: dir.path().join("out"),
        ..Default::default()
    }
}

fn embedder() -> SpecterEmbedder {
    SpecterEmbedder::load(SpecterConfig {
        embedding_dim: 16,
        ..SpecterConfig::stub()
    })
    .unwrap()
}

fn reviewers() -> Vec<ReviewerRecord> {
    vec![
        ReviewerRecord::new("Ada", "London").with_expertise(["computation"]),
        ReviewerRecord::new("Grace", "Navy").with_expertise(["compilers", "COBOL"]),
    ]
}

fn submissions(titles: &[&str]) -> Vec<SubmissionRecord> {
    titles
        .iter()
        .map(|t| SubmissionRecord::new(*t, format!("About {t}")))
        .collect()
}

fn output_is_empty(config: &Config) -> bool {
    std::fs::read_dir(&config.output_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

#[test]
fn test_stage_display() {
    assert_eq!(Stage::Authentication.to_string(), "authentication");
    assert_eq!(Stage::Submissions.to_string(), "submission extraction");
}

#[test]
fn test_live_run_caches_both_datasets() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let source = MockSourceAdapter::new()
        .with_reviewers(reviewers())
        .with_submissions(submissions(&["One", "Two", "Three"]));

    let mut pipeline = Pipeline::new(&config, source, embedder());
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.reviewers, 2);
    assert_eq!(summary.papers, 3);
    assert_eq!(summary.reviewer_origin, Origin::Live);
    assert_eq!(summary.submission_origin, Origin::Live);
    assert!(summary.drift.is_none());
    assert!(summary.paths.distance_matrix.is_file());
    assert!(summary.paths.paper_index.is_file());

    let calls = pipeline.source().calls();
    assert_eq!(calls.authenticate, 1);

    let cache = pipeline.cache();
    assert_eq!(cache.require::<ReviewerRecord>().unwrap(), reviewers());
    assert_eq!(cache.require::<SubmissionRecord>().unwrap().len(), 3);
}

#[test]
fn test_snapshots_skip_source_and_login() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    cache.store(&submissions(&["Cached"])).unwrap();

    let mut pipeline = Pipeline::new(&config, MockSourceAdapter::new(), embedder());
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.reviewer_origin, Origin::Snapshot);
    assert_eq!(summary.submission_origin, Origin::Snapshot);
    assert_eq!(pipeline.source().calls(), Default::default());
}

#[test]
fn test_reviewer_snapshot_never_refreshed() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        force_refresh_submissions: true,
        ..config(&dir)
    };
    RecordCache::new(&config.cache_dir)
        .store(&reviewers())
        .unwrap();

    let source = MockSourceAdapter::new()
        .with_reviewers(vec![ReviewerRecord::new("Someone Else", "Elsewhere")])
        .with_submissions(submissions(&["Live"]));
    let mut pipeline = Pipeline::new(&config, source, embedder());
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.reviewer_origin, Origin::Snapshot);
    assert_eq!(summary.submission_origin, Origin::Live);
    let calls = pipeline.source().calls();
    assert_eq!(calls.list_reviewers, 0);
    assert_eq!(calls.list_submissions, 1);
}

#[test]
fn test_forced_refresh_reports_drift() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        force_refresh_submissions: true,
        ..config(&dir)
    };
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    cache.store(&submissions(&["One", "Two"])).unwrap();

    let source = MockSourceAdapter::new().with_submissions(submissions(&["Two", "One"]));
    let mut pipeline = Pipeline::new(&config, source, embedder());
    let summary = pipeline.run().unwrap();

    let drift = summary.drift.expect("reordered titles");
    assert_eq!(drift.first_changed, Some(1));
    assert_eq!(
        cache.require::<SubmissionRecord>().unwrap()[0].title,
        "Two"
    );
}

#[test]
fn test_offline_without_snapshot_is_cache_miss() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        offline: true,
        ..config(&dir)
    };

    let mut pipeline = Pipeline::new(
        &config,
        MockSourceAdapter::new().with_reviewers(reviewers()),
        embedder(),
    );
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage(), Stage::Reviewers);
    assert!(matches!(
        err,
        RunError::Cache {
            source: CacheError::Miss { .. },
            ..
        }
    ));
    assert_eq!(pipeline.source().calls().authenticate, 0);
    assert!(output_is_empty(&config));
}

#[test]
fn test_offline_ignores_forced_refresh() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        offline: true,
        force_refresh_submissions: true,
        ..config(&dir)
    };
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    cache.store(&submissions(&["Cached"])).unwrap();

    let mut pipeline = Pipeline::new(&config, MockSourceAdapter::new(), embedder());
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.submission_origin, Origin::Snapshot);
    assert_eq!(pipeline.source().calls().list_submissions, 0);
}

#[test]
fn test_missing_credentials_fail_authentication() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        credentials: None,
        ..config(&dir)
    };

    let mut pipeline = Pipeline::new(&config, MockSourceAdapter::new(), embedder());
    let err = pipeline.run().unwrap_err();
    assert_eq!(err.stage(), Stage::Authentication);
    assert!(matches!(err, RunError::Config { .. }));
}

#[test]
fn test_rejected_credentials_abort_without_output() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    let source = MockSourceAdapter::new()
        .with_reviewers(reviewers())
        .rejecting_credentials();
    let mut pipeline = Pipeline::new(&config, source, embedder());
    let err = pipeline.run().unwrap_err();

    assert!(matches!(
        err,
        RunError::Source {
            stage: Stage::Authentication,
            source: SourceError::Authentication { .. }
        }
    ));
    assert!(output_is_empty(&config));
    assert!(!pipeline.cache().exists::<ReviewerRecord>());
}

#[test]
fn test_unreachable_listing_keeps_existing_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        force_refresh_submissions: true,
        ..config(&dir)
    };
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    cache.store(&submissions(&["Old"])).unwrap();

    let mut pipeline = Pipeline::new(
        &config,
        MockSourceAdapter::new().with_unreachable_listings(),
        embedder(),
    );
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage(), Stage::Submissions);
    assert!(matches!(
        err,
        RunError::Source {
            source: SourceError::Navigation { .. },
            ..
        }
    ));
    assert_eq!(cache.require::<SubmissionRecord>().unwrap()[0].title, "Old");
    assert!(output_is_empty(&config));
}

#[test]
fn test_empty_paper_aborts_with_paper_id() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let source = MockSourceAdapter::new()
        .with_reviewers(reviewers())
        .with_submissions(vec![
            SubmissionRecord::new("Fine", "Abstract"),
            SubmissionRecord::new("Also fine", "Abstract"),
            SubmissionRecord::new("", ""),
        ]);

    let mut pipeline = Pipeline::new(&config, source, embedder());
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage(), Stage::Matching);
    assert_eq!(err.paper_id(), Some(3));
    assert!(matches!(
        err,
        RunError::Match(MatchError::Paper {
            source: EmbeddingError::EmptyInput { .. },
            ..
        })
    ));
    assert!(output_is_empty(&config));
    // Extraction results survive for the next run.
    assert!(pipeline.cache().exists::<SubmissionRecord>());
}

#[test]
fn test_forced_refresh_replaces_corrupt_snapshot() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        force_refresh_submissions: true,
        ..config(&dir)
    };
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    std::fs::write(cache.snapshot_path::<SubmissionRecord>(), r#"[{"title": "trunc"#).unwrap();

    let source = MockSourceAdapter::new().with_submissions(submissions(&["Fresh"]));
    let mut pipeline = Pipeline::new(&config, source, embedder());
    let summary = pipeline.run().unwrap();

    assert_eq!(summary.submission_origin, Origin::Live);
    assert!(summary.drift.is_none());
    assert_eq!(pipeline.source().calls().list_submissions, 1);
    assert_eq!(cache.require::<SubmissionRecord>().unwrap()[0].title, "Fresh");
}

#[test]
fn test_corrupt_snapshot_without_refresh_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let cache = RecordCache::new(&config.cache_dir);
    cache.store(&reviewers()).unwrap();
    std::fs::write(cache.snapshot_path::<SubmissionRecord>(), r#"[{"title": "trunc"#).unwrap();

    let source = MockSourceAdapter::new().with_submissions(submissions(&["Fresh"]));
    let mut pipeline = Pipeline::new(&config, source, embedder());
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage(), Stage::Submissions);
    assert!(matches!(
        err,
        RunError::Cache {
            source: CacheError::Corrupt { .. },
            ..
        }
    ));
    assert_eq!(pipeline.source().calls().list_submissions, 0);
}

#[test]
fn test_placeholder_submission_is_matched_and_reported() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let source = MockSourceAdapter::new()
        .with_reviewers(reviewers())
        .with_submissions(vec![
            SubmissionRecord::new("One", "Abstract"),
            SubmissionRecord::new("Two", "Abstract"),
            SubmissionRecord::new("N/A", "N/A"),
        ]);

    let mut pipeline = Pipeline::new(&config, source, embedder());
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.papers, 3);
    assert_eq!(summary.placeholder_papers, vec![3]);

    // The stored snapshot still flags the paper on the next run.
    let mut rerun = Pipeline::new(&config, MockSourceAdapter::new(), embedder());
    let summary = rerun.run().unwrap();
    assert_eq!(summary.submission_origin, Origin::Snapshot);
    assert_eq!(summary.placeholder_papers, vec![3]);
}
