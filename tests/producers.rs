#[path = "common/mod.rs"]
mod common;

use common::*;
use dtstats::{
    build_short_stats, compute_full_stats, compute_keywords, dt_prefix, harvest_comments,
    process_keywords, process_stats, process_userstats, Comment, MemoryBackend, RawComment,
    StatsStore, StorageBackend, StoreOptions, FULLSTATS_KEY, KEYWORDS_KEY, SHORTSTATS_KEY,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};

fn opts() -> StoreOptions {
    StoreOptions::default().with_use_local(false)
}

fn fixture_comment(id: &str, author: &str, body: &str, score: i64, hour: u8) -> Comment {
    Comment {
        author: author.to_string(),
        author_flair_text: None,
        score,
        id: id.to_string(),
        permalink: format!("/r/test/comments/dt/{id}/"),
        body: body.to_string(),
        created_utc: OffsetDateTime::from_unix_timestamp(ts(day(), hour)).unwrap(),
        parent_id: Some("t3_sub".to_string()),
        embedding_model: None,
        embedding: None,
    }
}

fn raw(id: &str, author: Option<&str>, hour_offset: i64, body: &str) -> RawComment {
    RawComment {
        id: id.to_string(),
        author: author.map(String::from),
        author_flair_text: None,
        score: 1,
        permalink: format!("/r/test/comments/dt/{id}/"),
        body: body.to_string(),
        created_utc: (ts(day(), 12) + hour_offset * 3600) as f64,
        parent_id: Some("t3_sub".to_string()),
    }
}

/// Harvest drops bots and next-day stragglers, keeps authorless comments as
/// blanks, and stashes the survivors as the day's comments blob.
#[test]
fn harvest_filters_and_round_trips() {
    let backend = MemoryBackend::new();
    seed_basic_day(&backend, day() - Duration::days(1));
    let mut store = StatsStore::new(vec![Box::new(backend)]).unwrap();

    let raws = vec![
        raw("keep", Some("alice"), 0, "a normal comment"),
        raw("bot", Some("jobautomator"), 0, "the daily thread"),
        raw("blank", None, 0, "[deleted]"),
        // Next day, two hours past the new thread's creation: too new.
        raw("straggler", Some("bob"), 21, "good morning"),
    ];
    let written = harvest_comments(&store, day(), raws, &opts()).unwrap();
    assert_eq!(written, 2);

    let comments = store.read_comments(&[day()], None);
    assert_eq!(comments.len(), 2);
    let blank = comments.iter().find(|c| c.id == "blank").unwrap();
    assert_eq!(blank.author, "");
    assert_eq!(blank.score, 0);
    assert_eq!(blank.body, "[deleted]");
}

#[test]
fn full_stats_counts_and_tables() {
    let comments = vec![
        fixture_comment("c1", "alice", "short one", 10, 8),
        fixture_comment("c2", "alice", "a much longer comment with many words", 5, 8),
        fixture_comment("c3", "bob", "hello !ping FRIENDS", 20, 9),
        fixture_comment("c4", "carol", "ok", 1, 10),
        fixture_comment("c5", "dave", "fine", 2, 10),
        fixture_comment("c6", "jobautomator", "the daily thread", 100, 7),
        fixture_comment("del", "", "[deleted]", 0, 11),
        fixture_comment("rem", "", "[removed]", 0, 11),
    ];

    let full = compute_full_stats(&comments, &opts());
    assert_eq!(full.deleted, 1);
    assert_eq!(full.removed, 1);
    assert_eq!(full.other_blank, 0);
    assert_eq!(full.unique_users, 4, "bot and blanks are pruned");

    assert_eq!(full.spammiest[0].author, "alice");
    assert_eq!(full.spammiest[0].comment_count, 2);

    assert_eq!(full.wordiest_overall[0].author, "alice");
    assert_eq!(full.wordiest_overall[0].word_count, 2 + 7);

    // Top comment is bob's, with the ping trigger defanged.
    assert_eq!(full.upvoted_comments[0]["author"], "bob");
    assert_eq!(full.upvoted_comments[0]["body"], "hello *ping FRIENDS");

    assert_eq!(full.upvoted_redditors[0].author, "bob");
    assert_eq!(full.best_redditors[0].author, "bob");
    assert!((full.best_redditors[0].avg_score - 20.0).abs() < f64::EPSILON);

    // Activity buckets by UTC hour over the pruned set.
    let by_hour: Vec<usize> = full.activity.iter().map(|h| h.comment_count).collect();
    assert_eq!(by_hour.iter().sum::<usize>(), 5);
    assert_eq!(by_hour[8], 2);
    assert_eq!(by_hour[9], 1);
    assert_eq!(by_hour[10], 2);
}

#[test]
fn short_stats_truncates_lists_but_keeps_activity() {
    let comments: Vec<Comment> = (0..6)
        .map(|i| fixture_comment(&format!("c{i}"), &format!("user{i}"), "hello there", i, 9))
        .collect();

    let full = serde_json::to_value(compute_full_stats(&comments, &opts())).unwrap();
    let short = build_short_stats(&full);

    assert_eq!(short["spammiest"].as_array().unwrap().len(), 3);
    assert_eq!(short["upvoted_comments"].as_array().unwrap().len(), 3);
    assert_eq!(short["activity"].as_array().unwrap().len(), 24);
    assert_eq!(short["unique_users"], 6);
}

#[test]
fn process_stats_writes_both_blobs() {
    let mut store = basic_store();
    process_stats(&mut store, 0, &opts()).unwrap();

    let prefix = dt_prefix(day());
    let full = store.read(&prefix, FULLSTATS_KEY).unwrap();
    let short = store.read(&prefix, SHORTSTATS_KEY).unwrap();
    assert_eq!(full["unique_users"], 5);
    assert_eq!(short["unique_users"], 5);
}

#[test]
fn keywords_score_topics_and_drop_noise() {
    let comments: Vec<Comment> = (0..4)
        .map(|i| {
            fixture_comment(
                &format!("c{i}"),
                "alice",
                "the central bank raised interest rates because inflation is sticky",
                1,
                9,
            )
        })
        .collect();

    let report = compute_keywords(&comments, &opts());
    let scores: std::collections::HashMap<&str, f64> = report
        .keyword_scores
        .iter()
        .map(|(k, s)| (k.as_str(), *s))
        .collect();

    assert!(scores["inflation"] >= 4.0);
    assert!(scores.contains_key("interest rates"));
    assert!(!scores.keys().any(|k| *k == "the" || *k == "is" || *k == "because"));
    assert!(!report.keywords_h1.is_empty());
    // Every surviving score clears the significance floor.
    assert!(report.keyword_scores.iter().all(|(_, s)| *s > 3.0));
}

#[test]
fn process_keywords_writes_the_blob() {
    let backend = MemoryBackend::new();
    let blob = json!((0..5)
        .map(|i| comment_json(
            &format!("c{i}"),
            "alice",
            Some("t3_sub"),
            "everyone is discussing housing policy and zoning reform again",
            1,
            ts(day(), 9)
        ))
        .collect::<Vec<_>>());
    backend.write(&dt_prefix(day()), &[(dtstats::COMMENTS_KEY, &blob)]).unwrap();

    let mut store = StatsStore::new(vec![Box::new(backend)]).unwrap();
    let report = process_keywords(&mut store, 0, &opts()).unwrap();
    assert!(!report.keyword_scores.is_empty());

    let stored = store.read(&dt_prefix(day()), KEYWORDS_KEY).unwrap();
    assert!(stored["keyword_scores"].as_array().unwrap().len() >= 1);
}

#[test]
fn userstats_aggregates_across_days_and_writes_blob() {
    let backend = MemoryBackend::new();
    seed_basic_day_suffixed(&backend, day() - Duration::days(1), "-prev");
    seed_basic_day(&backend, day());
    let mut store = StatsStore::new(vec![Box::new(backend)]).unwrap();

    let results = process_userstats(&mut store, "alice", 7, &opts()).unwrap();
    assert_eq!(results.span, "week");
    assert_eq!(results.username, "alice");
    // alice wrote root1 (10) and child3 (8) on each of the two days.
    assert_eq!(results.comments_per_day.max, 2);
    assert!((results.comments_per_day.mean - 2.0).abs() < f64::EPSILON);
    assert!((results.average_score - 9.0).abs() < f64::EPSILON);
    assert_eq!(results.top_comment.as_ref().unwrap()["score"], 10);
    assert_eq!(results.threads.len(), 4, "two conversations per day");

    let stored = store.read(store.latest_dt_prefix(), "userstats-alice-week").unwrap();
    assert_eq!(stored["span"], "week");
    assert_eq!(stored["average_score"], 9.0);
}

#[test]
fn userstats_reuses_a_fresh_cached_result() {
    let mut store = basic_store();
    let cached = json!({
        "comments_per_day": {"mean": 1.0, "max": 1, "max_day": "2024-03-15"},
        "words_per_comment": {"mean": 3.0, "max": 5},
        "top_comment": null,
        "average_score": 999.0,
        "username": "alice",
        "span": "week",
    });
    store.write(&dt_prefix(day()), &[("userstats-alice-week", &cached)]);

    let cached_opts = opts().with_use_cache(true);
    let results = process_userstats(&mut store, "alice", 7, &cached_opts).unwrap();
    assert!((results.average_score - 999.0).abs() < f64::EPSILON, "fresh cache wins");

    // Without caching the real numbers are rebuilt.
    let results = process_userstats(&mut store, "alice", 7, &opts().with_use_cache(false)).unwrap();
    assert!((results.average_score - 9.0).abs() < f64::EPSILON);
}
