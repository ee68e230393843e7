use dtstats::{Comment, MemoryBackend, StatsStore, StorageBackend, COMMENTS_KEY};
use serde_json::{json, Value};
use time::macros::date;
use time::{Date, OffsetDateTime, Time};

/// The fixture day every test uses unless it needs a window.
pub fn day() -> Date {
    date!(2024 - 03 - 15)
}

/// Epoch seconds for `hour`:00:00 UTC on `d`.
pub fn ts(d: Date, hour: u8) -> i64 {
    d.with_time(Time::from_hms(hour, 0, 0).unwrap()).assume_utc().unix_timestamp()
}

/// Build an in-memory `Comment` for index/thread tests.
pub fn mk_comment(id: &str, author: &str, parent_id: Option<&str>, body: &str, score: i64) -> Comment {
    Comment {
        author: author.to_string(),
        author_flair_text: None,
        score,
        id: id.to_string(),
        permalink: format!("/r/test/comments/dt/{id}/"),
        body: body.to_string(),
        created_utc: OffsetDateTime::from_unix_timestamp(ts(day(), 12)).unwrap(),
        parent_id: parent_id.map(String::from),
        embedding_model: None,
        embedding: None,
    }
}

/// Wire-shape comment record as it sits in a stored `comments` blob.
pub fn comment_json(
    id: &str,
    author: &str,
    parent_id: Option<&str>,
    body: &str,
    score: i64,
    created_utc: i64,
) -> Value {
    let mut v = json!({
        "author": author,
        "author_flair_text": null,
        "score": score,
        "id": id,
        "permalink": format!("/r/test/comments/dt/{id}/"),
        "body": body,
        "created_utc": created_utc,
    });
    if let Some(p) = parent_id {
        v["parent_id"] = json!(p);
    }
    v
}

/// A day with two independent conversation chains plus one standalone
/// top-level comment:
///   root1 (alice) <- child1 (bob) <- child2 (carol)
///   root2 (dave)  <- child3 (alice)
///   solo (erin)
pub fn seed_basic_day(backend: &MemoryBackend, d: Date) {
    seed_basic_day_suffixed(backend, d, "");
}

/// Same shape as `seed_basic_day` with `sfx` appended to every comment id,
/// for multi-day fixtures (ids are unique across a real corpus).
pub fn seed_basic_day_suffixed(backend: &MemoryBackend, d: Date, sfx: &str) {
    let id = |base: &str| format!("{base}{sfx}");
    let t1 = |base: &str| format!("t1_{base}{sfx}");
    let comments = json!([
        comment_json(&id("root1"), "alice", Some("t3_sub"), "rust is neat", 10, ts(d, 8)),
        comment_json(&id("child1"), "bob", Some(&t1("root1")), "agreed entirely", 6, ts(d, 9)),
        comment_json(&id("child2"), "carol", Some(&t1("child1")), "same here", 2, ts(d, 10)),
        comment_json(&id("root2"), "dave", Some("t3_sub"), "lunch thoughts", 4, ts(d, 11)),
        comment_json(&id("child3"), "alice", Some(&t1("root2")), "tacos again", 8, ts(d, 12)),
        comment_json(&id("solo"), "erin", Some("t3_sub"), "quiet afternoon", 1, ts(d, 13)),
    ]);
    backend
        .write(&dtstats::dt_prefix(d), &[(COMMENTS_KEY, &comments)])
        .unwrap();
}

/// A memory-backed store holding the basic fixture day.
pub fn basic_store() -> StatsStore {
    let backend = MemoryBackend::new();
    seed_basic_day(&backend, day());
    StatsStore::new(vec![Box::new(backend)]).unwrap()
}
