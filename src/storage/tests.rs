use super::*;
use crate::records::{PotentialReviewer, ReviewerRecord, SubmissionRecord};
use std::fs;
use tempfile::TempDir;

fn create_test_cache() -> (RecordCache, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let cache = RecordCache::new(dir.path());
    (cache, dir)
}

fn sample_reviewers() -> Vec<ReviewerRecord> {
    vec![
        ReviewerRecord::new("Ada Lovelace", "Analytical Engines")
            .with_expertise(["computing", "poetry"]),
        ReviewerRecord::new("Grace Hopper", "N/A").with_mail("grace@example.org"),
    ]
}

#[test]
fn test_load_missing_returns_none() {
    let (cache, _dir) = create_test_cache();

    let loaded = cache.load::<ReviewerRecord>().expect("load should not fail");
    assert!(loaded.is_none());
    assert!(!cache.exists::<ReviewerRecord>());
}

#[test]
fn test_require_missing_is_cache_miss() {
    let (cache, _dir) = create_test_cache();

    let result = cache.require::<SubmissionRecord>();
    assert!(matches!(result, Err(CacheError::Miss { .. })));
}

#[test]
fn test_store_and_load_round_trip() {
    let (cache, _dir) = create_test_cache();
    let reviewers = sample_reviewers();

    cache.store(&reviewers).expect("Failed to store");
    let loaded = cache
        .load::<ReviewerRecord>()
        .expect("Failed to load")
        .expect("snapshot should exist");

    assert_eq!(loaded, reviewers);
}

#[test]
fn test_store_and_load_empty_collection() {
    let (cache, _dir) = create_test_cache();

    cache
        .store::<SubmissionRecord>(&[])
        .expect("Failed to store empty");
    let loaded = cache
        .load::<SubmissionRecord>()
        .expect("Failed to load")
        .expect("snapshot should exist");

    assert!(loaded.is_empty());
}

#[test]
fn test_store_and_load_non_ascii() {
    let (cache, _dir) = create_test_cache();

    let mut row = PotentialReviewer::new();
    row.insert("Name".to_string(), "Jürgen Müller".to_string());
    let papers = vec![
        SubmissionRecord::new("Über Interaktion", "日本語の要約 — naïve café")
            .with_potential_reviewers(vec![row]),
    ];

    cache.store(&papers).expect("Failed to store");
    let loaded = cache.require::<SubmissionRecord>().expect("Failed to load");
    assert_eq!(loaded, papers);

    let raw = fs::read_to_string(cache.snapshot_path::<SubmissionRecord>()).unwrap();
    assert!(raw.contains("Über Interaktion"));
    assert!(raw.contains("日本語の要約"));
    assert!(!raw.contains("\\u"));
}

#[test]
fn test_snapshot_uses_two_space_indentation() {
    let (cache, _dir) = create_test_cache();
    cache.store(&sample_reviewers()).unwrap();

    let raw = fs::read_to_string(cache.snapshot_path::<ReviewerRecord>()).unwrap();
    assert!(raw.starts_with("[\n  {\n    \"name\": \"Ada Lovelace\""));
}

#[test]
fn test_load_is_idempotent() {
    let (cache, _dir) = create_test_cache();
    cache.store(&sample_reviewers()).unwrap();

    let first = cache.load::<ReviewerRecord>().unwrap();
    let second = cache.load::<ReviewerRecord>().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_store_overwrites_previous_snapshot() {
    let (cache, _dir) = create_test_cache();
    cache.store(&sample_reviewers()).unwrap();

    let replacement = vec![ReviewerRecord::new("Only One", "Somewhere")];
    cache.store(&replacement).unwrap();

    assert_eq!(cache.require::<ReviewerRecord>().unwrap(), replacement);
}

#[test]
fn test_store_leaves_no_temp_files() {
    let (cache, dir) = create_test_cache();
    cache.store(&sample_reviewers()).unwrap();
    cache.store(&sample_reviewers()).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["reviewers.txt".to_string()]);
}

#[test]
fn test_orphaned_temp_file_does_not_affect_snapshot() {
    let (cache, dir) = create_test_cache();
    let reviewers = sample_reviewers();
    cache.store(&reviewers).unwrap();

    // What an interrupted write leaves behind.
    fs::write(dir.path().join(".tmpA1b2C3"), "[{\"name\": \"trunc").unwrap();

    assert_eq!(cache.require::<ReviewerRecord>().unwrap(), reviewers);
}

#[test]
fn test_corrupt_snapshot_is_reported() {
    let (cache, _dir) = create_test_cache();
    fs::write(cache.snapshot_path::<ReviewerRecord>(), "not json").unwrap();

    let result = cache.load::<ReviewerRecord>();
    assert!(matches!(result, Err(CacheError::Corrupt { .. })));
}

#[test]
fn test_store_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let cache = RecordCache::new(dir.path().join("nested").join("cache"));

    cache.store(&sample_reviewers()).unwrap();
    assert!(cache.exists::<ReviewerRecord>());
}

#[test]
fn test_write_atomic_replaces_contents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json");

    write_atomic(&path, b"first").unwrap();
    write_atomic(&path, b"second").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
}

#[test]
fn test_write_atomic_all_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.json");
    fs::write(&first, "old").unwrap();
    fs::create_dir(&second).unwrap();

    let result = write_atomic_all(&[
        (first.as_path(), b"new".as_slice()),
        (second.as_path(), b"{}".as_slice()),
    ]);

    assert!(matches!(result, Err(StorageError::WriteFailed { ref path, .. }) if *path == second));
    assert_eq!(fs::read_to_string(&first).unwrap(), "old");
    // Staged temp files are cleaned up.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_write_atomic_all_replaces_every_file() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.csv");
    let second = dir.path().join("nested").join("b.json");

    write_atomic_all(&[
        (first.as_path(), b"one".as_slice()),
        (second.as_path(), b"two".as_slice()),
    ])
    .unwrap();

    assert_eq!(fs::read_to_string(&first).unwrap(), "one");
    assert_eq!(fs::read_to_string(&second).unwrap(), "two");
}
