use crate::config::{StoreOptions, KEYWORDS_KEY};
use crate::date::{dt_prefix, target_dt_date};
use crate::models::Comment;
use crate::store::StatsStore;
use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use time::OffsetDateTime;

/// Phrases that summon bots; any candidate containing one is discarded.
const BOT_TRIGGERS: &[&str] = &["malarkey level", "magic goolsball", "ping"];

/// Generic words that dominate rankings without carrying topic signal.
const COMMON_WORDS: &[&str] = &[
    "account", "anybody", "anyone", "anything", "area", "article", "bit", "bunch", "clue",
    "comment", "comments", "count", "country", "couple", "day", "days", "difference",
    "discussion", "dude", "end", "everyone", "everything", "fine", "friend", "good", "group",
    "guy", "guys", "half", "head", "hours", "image", "issue", "issues", "kind", "level", "life",
    "line", "list", "lot", "lots", "man", "matter", "minutes", "name", "need", "news", "nobody",
    "none", "nothing", "number", "one", "ones", "others", "part", "people", "picture", "place",
    "places", "please", "point", "post", "posts", "problem", "question", "questions", "reddit",
    "remember", "replies", "rest", "sense", "shit", "side", "somebody", "someone", "something",
    "sort", "story", "stuff", "sub", "support", "system", "take", "tbh", "thanks", "theory",
    "thing", "things", "think", "thread", "time", "times", "today", "ton", "topic", "try",
    "type", "user", "users", "way", "week", "word", "words", "yes",
];

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s",
    "same", "she", "should", "so", "some", "such", "t", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "you", "your",
    "yours", "yourself", "yourselves",
];

/// The `keywords` blob shape: scored phrases plus pre-sliced heading tiers.
#[derive(Clone, Debug, Serialize)]
pub struct KeywordReport {
    pub keyword_scores: Vec<(String, f64)>,
    pub keywords_h1: Vec<String>,
    pub keywords_h2: Vec<String>,
    pub keywords_h3: Vec<String>,
    pub keywords_h4: Vec<String>,
    pub keywords_h5: Vec<String>,
    pub keywords_h6: Vec<String>,
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

fn is_common(word: &str) -> bool {
    COMMON_WORDS.binary_search(&word).is_ok()
}

/// Keep words that are neither too short, too long, nor stopwords.
fn goodstr(word: &str) -> bool {
    word.len() > 2 && word.len() < 40 && !is_stopword(word)
}

/// Lowercase, strip URLs and markdown punctuation, keep word characters.
fn clean(body: &str) -> String {
    let no_urls = url_regex().replace_all(body, " ");
    no_urls
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_alphanumeric() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Score candidate phrases in one comment body: kept unigrams score 1, and
/// bigrams of kept words score 1.5 — multiword noun-ish phrases are the
/// strongest topic signal this side of a real chunker. Anything headed by a
/// common word, or containing a bot trigger, scores nothing.
fn parse_comment(body: &str, scores: &mut AHashMap<String, f64>) {
    let cleaned = clean(body);
    let tokens: Vec<&str> = cleaned.split_whitespace().filter(|w| goodstr(w)).collect();

    for window in tokens.windows(2) {
        let phrase = format!("{} {}", window[0], window[1]);
        if is_common(window[0]) || is_common(window[1]) {
            continue;
        }
        if BOT_TRIGGERS.iter().any(|t| phrase.contains(t)) {
            continue;
        }
        *scores.entry(phrase).or_insert(0.0) += 1.5;
    }

    for token in &tokens {
        if is_common(token) || BOT_TRIGGERS.iter().any(|t| token.contains(t)) {
            continue;
        }
        *scores.entry((*token).to_string()).or_insert(0.0) += 1.0;
    }
}

/// Pull significant keywords out of a day's comments, scored and sorted.
/// Only phrases scoring above 3 survive.
pub fn compute_keywords(comments: &[Comment], opts: &StoreOptions) -> KeywordReport {
    let mut scores: AHashMap<String, f64> = AHashMap::new();
    for comment in comments {
        if comment.author.is_empty() || opts.is_excluded(&comment.author) {
            continue;
        }
        parse_comment(&comment.body, &mut scores);
    }

    let mut filtered: Vec<(String, f64)> = scores.into_iter().filter(|(_, s)| *s > 3.0).collect();
    filtered.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    let tier = |range: std::ops::Range<usize>| -> Vec<String> {
        filtered
            .iter()
            .skip(range.start)
            .take(range.len())
            .map(|(k, _)| k.clone())
            .collect()
    };

    KeywordReport {
        keywords_h1: tier(0..10),
        keywords_h2: tier(10..30),
        keywords_h3: tier(30..60),
        keywords_h4: tier(60..120),
        keywords_h5: tier(120..180),
        keywords_h6: tier(180..240),
        keyword_scores: filtered,
    }
}

/// Score a day's keywords and write the `keywords` blob.
/// `daysago == 0` targets the latest available day.
pub fn process_keywords(store: &mut StatsStore, daysago: i64, opts: &StoreOptions) -> Result<KeywordReport> {
    let dt_date = if daysago > 0 {
        target_dt_date(daysago, OffsetDateTime::now_utc(), opts.create_hour)
    } else {
        store.latest_dt_date()
    };
    tracing::info!("processing keywords for {}", dt_prefix(dt_date));

    let comments = store.read_comments(&[dt_date], None);
    if comments.is_empty() {
        bail!("no comments available for {}", dt_prefix(dt_date));
    }

    let report = compute_keywords(&comments, opts);
    tracing::info!("keyword count: {}", report.keyword_scores.len());

    let value = serde_json::to_value(&report).context("serializing keywords")?;
    store.write(&dt_prefix(dt_date), &[(KEYWORDS_KEY, &value)]);
    Ok(report)
}
