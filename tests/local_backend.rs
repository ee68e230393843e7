#[path = "common/mod.rs"]
mod common;

use common::*;
use dtstats::{BackendError, LocalBackend, StorageBackend, COMMENTS_KEY};
use serde_json::json;
use std::fs;

#[test]
fn write_then_read_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    let stats = json!({"unique_users": 42, "spammiest": [{"author": "alice", "comment_count": 7}]});
    backend.write("2024-03-15", &[("full_stats", &stats)]).unwrap();

    let restored = backend.read("2024-03-15", "full_stats").unwrap();
    assert_eq!(restored, stats);

    // Blobs land at <root>/<prefix>/<name>.json.
    assert!(tmp.path().join("2024-03-15").join("full_stats.json").exists());
}

#[test]
fn missing_blob_is_a_typed_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    let err = backend.read("2024-03-15", "full_stats").err().unwrap();
    assert!(matches!(err, BackendError::NotFound { .. }));

    let err = backend.get_age("2024-03-15", "full_stats").err().unwrap();
    assert!(matches!(err, BackendError::NotFound { .. }));
}

#[test]
fn corrupt_blob_is_a_typed_decode_error() {
    let tmp = tempfile::tempdir().unwrap();
    let prefix_dir = tmp.path().join("2024-03-15");
    fs::create_dir_all(&prefix_dir).unwrap();
    fs::write(prefix_dir.join("full_stats.json"), b"{ definitely not json").unwrap();

    let backend = LocalBackend::new(tmp.path());
    let err = backend.read("2024-03-15", "full_stats").err().unwrap();
    assert!(matches!(err, BackendError::Decode { .. }));
}

#[test]
fn listing_returns_only_day_shaped_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    backend.write("2024-03-14", &[("comments", &json!([]))]).unwrap();
    backend.write("2024-03-15", &[("comments", &json!([]))]).unwrap();
    fs::create_dir_all(tmp.path().join("scratch")).unwrap();
    fs::create_dir_all(tmp.path().join("2024-03")).unwrap();
    fs::write(tmp.path().join("2024-03-13"), b"a file, not a day dir").unwrap();

    let mut listing = backend.get_listing().unwrap();
    listing.sort();
    assert_eq!(listing, ["2024-03-14", "2024-03-15"]);
}

#[test]
fn age_counts_seconds_since_modification() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());
    backend.write("2024-03-15", &[("comments", &json!([]))]).unwrap();

    let age = backend.get_age("2024-03-15", "comments").unwrap();
    assert!(age < 60, "freshly written file should be seconds old, got {age}");
}

#[test]
fn read_comments_decodes_the_day_blob() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(tmp.path());

    let blob = json!([
        comment_json("c1", "alice", Some("t3_sub"), "hello", 4, ts(day(), 9)),
        comment_json("c2", "bob", Some("t1_c1"), "hi back", 2, ts(day(), 10)),
    ]);
    backend.write("2024-03-15", &[(COMMENTS_KEY, &blob)]).unwrap();

    let comments = backend.read_comments("2024-03-15").unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, "c1");
    assert_eq!(comments[1].parent_id.as_deref(), Some("t1_c1"));
    assert!(!comments[0].is_top_level() || comments[0].parent_id.as_deref() == Some("t3_sub"));
}
