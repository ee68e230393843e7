use crate::config::{StoreOptions, USERSTATS_PREFIX};
use crate::date::dt_prefix;
use crate::models::Comment;
use crate::store::StatsStore;
use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

/// Stats are cached per (user, span); a result younger than this is reused.
const CACHE_MAX_AGE_SECS: u64 = 86_400;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentsPerDay {
    pub mean: f64,
    pub max: usize,
    pub max_day: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WordsPerComment {
    pub mean: f64,
    pub max: usize,
}

/// Per-user results over an N-day window. The thread renderings are carried
/// in memory for report building but are not part of the stored blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserStatsResults {
    pub comments_per_day: CommentsPerDay,
    pub words_per_comment: WordsPerComment,
    pub top_comment: Option<Value>,
    pub average_score: f64,
    pub username: String,
    pub span: String,
    #[serde(skip)]
    pub threads: Vec<(String, i64)>,
}

/// Human name for an N-day window.
pub fn get_span(days: i64) -> &'static str {
    match days {
        1 => "day",
        7 => "week",
        30 => "month",
        d if d > 30 => "all time",
        _ => "span",
    }
}

fn userstats_key(username: &str, span: &str) -> String {
    format!("{USERSTATS_PREFIX}-{username}-{}", span.replace(' ', "_"))
}

fn word_count(body: &str) -> usize {
    body.matches(' ').count() + 1
}

fn build_results(
    store: &mut StatsStore,
    username: &str,
    days: i64,
    dt_dates: &[Date],
) -> Result<UserStatsResults> {
    let comments = store.read_comments(dt_dates, Some(username));
    if comments.is_empty() {
        bail!("no comments found for {username} across {days} days");
    }

    let mut per_day: AHashMap<Date, usize> = AHashMap::new();
    for c in &comments {
        *per_day.entry(c.created_utc.date()).or_insert(0) += 1;
    }
    let (max_day, max) = per_day
        .iter()
        .max_by_key(|(day, count)| (**count, std::cmp::Reverse(**day)))
        .map(|(day, count)| (*day, *count))
        .expect("comments is non-empty");
    let comments_per_day = CommentsPerDay {
        mean: comments.len() as f64 / per_day.len() as f64,
        max,
        max_day: dt_prefix(max_day),
    };

    let word_counts: Vec<usize> = comments.iter().map(|c| word_count(&c.body)).collect();
    let words_per_comment = WordsPerComment {
        mean: word_counts.iter().sum::<usize>() as f64 / word_counts.len() as f64,
        max: word_counts.iter().copied().max().unwrap_or(0),
    };

    let top_comment: Option<&Comment> = comments.iter().max_by_key(|c| c.score);
    let average_score =
        comments.iter().map(|c| c.score).sum::<i64>() as f64 / comments.len() as f64;

    // Slim-rendered threads ranked by avg score, best first, for the report.
    let mut threads: Vec<(String, i64)> = store
        .read_threads(dt_dates, Some(username))
        .iter()
        .map(|t| (t.to_slim_text(0), t.get_avg_score()))
        .collect();
    threads.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(UserStatsResults {
        comments_per_day,
        words_per_comment,
        top_comment: top_comment.map(|c| serde_json::to_value(c).unwrap_or(Value::Null)),
        average_score,
        username: username.to_string(),
        span: get_span(days).to_string(),
        threads,
    })
}

fn read_cached(store: &StatsStore, username: &str, span: &str) -> Option<UserStatsResults> {
    let prefix = store.latest_dt_prefix().to_string();
    let key = userstats_key(username, span);
    let age = store.get_age(&prefix, &key).ok()?;
    if age > CACHE_MAX_AGE_SECS {
        return None;
    }
    let value = store.read(&prefix, &key).ok()?;
    serde_json::from_value(value).ok()
}

/// Daily stats, but for a single user across their last N thread days.
/// With caching enabled, a result written within the last day is reused.
pub fn process_userstats(
    store: &mut StatsStore,
    username: &str,
    days: i64,
    opts: &StoreOptions,
) -> Result<UserStatsResults> {
    let span = get_span(days);

    if opts.use_cache {
        if let Some(cached) = read_cached(store, username, span) {
            tracing::info!("cache hit: {username} / {days}.");
            return Ok(cached);
        }
    }
    tracing::info!("cache miss: {username} / {days}. building results...");

    let dt_dates = store.get_dt_dates(days, None);
    let results = build_results(store, username, days, &dt_dates)?;

    let value = serde_json::to_value(&results).context("serializing userstats")?;
    let prefix = store.latest_dt_prefix().to_string();
    store.write(&prefix, &[(userstats_key(username, span).as_str(), &value)]);
    Ok(results)
}
