use crate::config::{StoreOptions, FULLSTATS_KEY, SHORTSTATS_KEY};
use crate::date::{dt_prefix, target_dt_date};
use crate::models::Comment;
use crate::store::StatsStore;
use crate::util::neuter_ping;
use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use time::OffsetDateTime;

#[derive(Clone, Debug, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub author_flair_text: Option<String>,
    pub comment_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorWords {
    pub author: String,
    pub author_flair_text: Option<String>,
    pub word_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorAvgWords {
    pub author: String,
    pub author_flair_text: Option<String>,
    pub avg_words: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorScore {
    pub author: String,
    pub author_flair_text: Option<String>,
    pub score: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorAvgScore {
    pub author: String,
    pub avg_score: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct HourActivity {
    pub hour: u8,
    pub comment_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct FlairPopulation {
    pub unflaired: usize,
    /// (user count, flairmoji), most common first.
    pub flaired: Vec<(usize, String)>,
}

/// The full daily stats blob. `build_short_stats` derives the truncated
/// variant posted back to the thread.
#[derive(Clone, Debug, Serialize)]
pub struct FullStats {
    pub deleted: usize,
    pub removed: usize,
    pub other_blank: usize,
    pub unique_users: usize,
    pub spammiest: Vec<AuthorCount>,
    pub wordiest_overall: Vec<AuthorWords>,
    pub wordiest: Vec<AuthorAvgWords>,
    pub upvoted_comments: Vec<Value>,
    pub upvoted_redditors: Vec<AuthorScore>,
    pub best_redditors: Vec<AuthorAvgScore>,
    pub activity: Vec<HourActivity>,
    pub flair_population: FlairPopulation,
}

fn flairmoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".*(:[\-\w]+:)\s(.*)").unwrap())
}

fn extract_flairmoji(flair_text: Option<&str>) -> String {
    let Some(flair) = flair_text else { return String::new() };
    flairmoji_regex()
        .captures(flair)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn word_count(body: &str) -> usize {
    body.matches(' ').count() + 1
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

struct AuthorAgg {
    flair: Option<String>,
    comment_count: usize,
    word_count: usize,
    score: i64,
}

/// Build the full daily stats from one day's comments. Blank-author comments
/// (deleted/removed) are triaged into counters and pruned before the
/// per-author tables; excluded (bot) authors are pruned entirely.
pub fn compute_full_stats(comments: &[Comment], opts: &StoreOptions) -> FullStats {
    let mut deleted = 0usize;
    let mut removed = 0usize;
    let mut other_blank = 0usize;

    let kept: Vec<&Comment> = comments
        .iter()
        .filter(|c| !opts.is_excluded(&c.author))
        .filter(|c| {
            if c.author.is_empty() {
                match c.body.as_str() {
                    "[deleted]" => deleted += 1,
                    "[removed]" => removed += 1,
                    _ => other_blank += 1,
                }
                false
            } else {
                true
            }
        })
        .collect();

    let mut by_author: AHashMap<&str, AuthorAgg> = AHashMap::new();
    for c in &kept {
        let agg = by_author.entry(c.author.as_str()).or_insert_with(|| AuthorAgg {
            flair: c.author_flair_text.clone(),
            comment_count: 0,
            word_count: 0,
            score: 0,
        });
        agg.comment_count += 1;
        agg.word_count += word_count(&c.body);
        agg.score += c.score;
    }

    let mut spammiest: Vec<AuthorCount> = by_author
        .iter()
        .map(|(author, agg)| AuthorCount {
            author: author.to_string(),
            author_flair_text: agg.flair.clone(),
            comment_count: agg.comment_count,
        })
        .collect();
    spammiest.sort_by(|a, b| b.comment_count.cmp(&a.comment_count).then(a.author.cmp(&b.author)));

    let mut wordiest_overall: Vec<AuthorWords> = by_author
        .iter()
        .map(|(author, agg)| AuthorWords {
            author: author.to_string(),
            author_flair_text: agg.flair.clone(),
            word_count: agg.word_count,
        })
        .collect();
    wordiest_overall.sort_by(|a, b| b.word_count.cmp(&a.word_count).then(a.author.cmp(&b.author)));

    let mut wordiest: Vec<AuthorAvgWords> = by_author
        .iter()
        .map(|(author, agg)| AuthorAvgWords {
            author: author.to_string(),
            author_flair_text: agg.flair.clone(),
            avg_words: round1(agg.word_count as f64 / agg.comment_count as f64),
        })
        .collect();
    wordiest.sort_by(|a, b| {
        b.avg_words.partial_cmp(&a.avg_words).unwrap_or(std::cmp::Ordering::Equal).then(a.author.cmp(&b.author))
    });

    // Top comments get their bodies neutered so reposting them can't ping.
    let mut top_comments: Vec<&Comment> = kept.clone();
    top_comments.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
    let upvoted_comments: Vec<Value> = top_comments
        .iter()
        .map(|c| {
            let mut neutered = (*c).clone();
            neutered.body = neuter_ping(&neutered.body);
            serde_json::to_value(&neutered).unwrap_or(Value::Null)
        })
        .collect();

    let mut upvoted_redditors: Vec<AuthorScore> = by_author
        .iter()
        .map(|(author, agg)| AuthorScore {
            author: author.to_string(),
            author_flair_text: agg.flair.clone(),
            score: agg.score,
        })
        .collect();
    upvoted_redditors.sort_by(|a, b| b.score.cmp(&a.score).then(a.author.cmp(&b.author)));

    let mut best_redditors: Vec<AuthorAvgScore> = by_author
        .iter()
        .map(|(author, agg)| AuthorAvgScore {
            author: author.to_string(),
            avg_score: round2(agg.score as f64 / agg.comment_count as f64),
        })
        .collect();
    best_redditors.sort_by(|a, b| {
        b.avg_score.partial_cmp(&a.avg_score).unwrap_or(std::cmp::Ordering::Equal).then(a.author.cmp(&b.author))
    });

    let mut hour_counts = [0usize; 24];
    for c in &kept {
        hour_counts[c.created_utc.hour() as usize] += 1;
    }
    let activity: Vec<HourActivity> = hour_counts
        .iter()
        .enumerate()
        .map(|(hour, &comment_count)| HourActivity { hour: hour as u8, comment_count })
        .collect();

    // Flair population over unique (author, flair) pairs.
    let mut unique: AHashMap<&str, Option<&str>> = AHashMap::new();
    for c in &kept {
        unique.entry(c.author.as_str()).or_insert(c.author_flair_text.as_deref());
    }
    let mut flair_counts: AHashMap<String, usize> = AHashMap::new();
    let mut unflaired = 0usize;
    for flair in unique.values() {
        let moji = extract_flairmoji(*flair);
        if moji.is_empty() {
            unflaired += 1;
        } else {
            *flair_counts.entry(moji).or_insert(0) += 1;
        }
    }
    let mut flaired: Vec<(usize, String)> = flair_counts.into_iter().map(|(m, n)| (n, m)).collect();
    flaired.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    FullStats {
        deleted,
        removed,
        other_blank,
        unique_users: unique.len(),
        spammiest,
        wordiest_overall,
        wordiest,
        upvoted_comments,
        upvoted_redditors,
        best_redditors,
        activity,
        flair_population: FlairPopulation { unflaired, flaired },
    }
}

/// Truncate every list value to its top 3 entries, keeping hourly/activity
/// series whole. Works over the serialized form so derived keys stay in sync
/// with `FullStats` automatically.
pub fn build_short_stats(full_stats: &Value) -> Value {
    let Value::Object(map) = full_stats else {
        return full_stats.clone();
    };
    let mut short = serde_json::Map::new();
    for (k, v) in map {
        let keep_whole = k == "activity" || k.starts_with("hourly");
        match v {
            Value::Array(items) if !keep_whole => {
                short.insert(k.clone(), Value::Array(items.iter().take(3).cloned().collect()));
            }
            _ => {
                short.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(short)
}

/// Pull basic statistics from a day's comments and write the full and short
/// blobs. `daysago == 0` targets the latest available day.
pub fn process_stats(store: &mut StatsStore, daysago: i64, opts: &StoreOptions) -> Result<Value> {
    let dt_date = if daysago > 0 {
        target_dt_date(daysago, OffsetDateTime::now_utc(), opts.create_hour)
    } else {
        store.latest_dt_date()
    };
    tracing::info!("processing stats for {}", dt_prefix(dt_date));

    let comments = store.read_comments(&[dt_date], None);
    if comments.is_empty() {
        bail!("no comments available for {}", dt_prefix(dt_date));
    }

    let full_stats = compute_full_stats(&comments, opts);
    let full_value = serde_json::to_value(&full_stats).context("serializing full stats")?;
    let short_value = build_short_stats(&full_value);

    let prefix = dt_prefix(dt_date);
    store.write(&prefix, &[(FULLSTATS_KEY, &full_value), (SHORTSTATS_KEY, &short_value)]);
    Ok(short_value)
}
