use crate::config::{StoreOptions, COMMENTS_KEY};
use crate::date::dt_prefix;
use crate::models::Comment;
use crate::store::StatsStore;
use anyhow::{Context, Result};
use time::{Date, Duration, OffsetDateTime, Time};

/// Raw comment-like record supplied by the platform API client. The client
/// owns fetching, pagination expansion, and author-object resolution; the
/// core performs no network calls.
#[derive(Clone, Debug)]
pub struct RawComment {
    pub id: String,
    /// `None` for deleted/removed comments.
    pub author: Option<String>,
    pub author_flair_text: Option<String>,
    pub score: i64,
    pub permalink: String,
    pub body: String,
    /// Epoch seconds, fractional accepted.
    pub created_utc: f64,
    pub parent_id: Option<String>,
}

impl RawComment {
    fn created(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.created_utc as i64)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    fn into_comment(self) -> Comment {
        let created_utc = self.created();
        match self.author {
            Some(author) if !author.is_empty() => Comment {
                author,
                author_flair_text: self.author_flair_text,
                score: self.score,
                id: self.id,
                permalink: self.permalink,
                body: self.body,
                created_utc,
                parent_id: self.parent_id,
                embedding_model: None,
                embedding: None,
            },
            // Deleted, removed, and other blanked comments keep their place
            // in the thread but carry no author or score.
            _ => Comment {
                author: String::new(),
                author_flair_text: None,
                score: 0,
                id: self.id,
                permalink: self.permalink,
                body: self.body,
                created_utc,
                parent_id: self.parent_id,
                embedding_model: None,
                embedding: None,
            },
        }
    }
}

/// Convert a day's raw comments and stash them as the day's `comments` blob.
///
/// Rules: comments created after the end of the thread day (the next day's
/// creation hour) are dropped — recap harvests come with a handful of
/// next-day stragglers; bot/service authors are dropped; authorless comments
/// are kept as blanks. Returns the number of comments written.
pub fn harvest_comments<I>(
    store: &StatsStore,
    dt_date: Date,
    raw_comments: I,
    opts: &StoreOptions,
) -> Result<usize>
where
    I: IntoIterator<Item = RawComment>,
{
    let create_time = Time::from_hms(opts.create_hour, 0, 0).context("invalid create hour")?;
    let end_of_dt = (dt_date + Duration::days(1)).with_time(create_time).assume_utc();

    let mut comments = Vec::new();
    for raw in raw_comments {
        if raw.created() > end_of_dt {
            tracing::debug!("comment too new: {} at {}", raw.id, raw.created_utc);
            continue;
        }
        if let Some(author) = raw.author.as_deref() {
            if opts.is_excluded(author) {
                continue;
            }
        }
        comments.push(raw.into_comment());
    }

    let prefix = dt_prefix(dt_date);
    tracing::info!("writing {} comments to {prefix}", comments.len());
    let value = serde_json::to_value(&comments).context("serializing comments")?;
    store.write(&prefix, &[(COMMENTS_KEY, &value)]);
    Ok(comments.len())
}
