use crate::backend::{BackendError, StorageBackend};
use crate::config::{StoreOptions, COMMENTS_KEY};
use crate::date::{dt_dates_ending_at, dt_prefix, parse_dt_prefix};
use crate::index::{CommentsIndex, IndexError};
use crate::local::LocalBackend;
use crate::models::Comment;
use crate::object::ObjectStoreBackend;
use crate::thread::Thread;
use crate::util::{init_tracing_once, retry_with_backoff};
use ahash::AHashSet;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use time::Date;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no storage backends configured")]
    NoBackends,

    #[error("no day prefixes found in storage")]
    NoDayPrefixes,

    #[error("unable to load any results for {prefix}/{key}")]
    NotFound { prefix: String, key: String },

    #[error("unknown comment id {0}")]
    UnknownCommentId(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// External collaborator for the manual parent-id backfill path: resolves a
/// comment id to its `t1_`/`t3_`-prefixed parent reference via the platform
/// API. Transient failures are retried with bounded backoff by the store.
pub trait ParentLookup {
    fn get_parent_id(&self, comment_id: &str) -> anyhow::Result<Option<String>>;
}

fn prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap())
}

/// Reads and writes day-keyed JSON blobs through an ordered list of storage
/// backends, and owns the lazily built per-day comments index. Reads fall
/// through the backends in priority order; writes go to all of them.
///
/// One instance per process/run; the index is a process-scoped cache with no
/// eviction, which is the intended trade-off for short-lived batch jobs.
pub struct StatsStore {
    backends: Vec<Box<dyn StorageBackend>>,
    dts: Vec<String>, // available day prefixes, newest first
    idx: CommentsIndex,
}

impl StatsStore {
    /// Build a store over the given backends, discovering available day
    /// prefixes from the first one. Fails fast when no backend is configured
    /// or no day-shaped prefix exists.
    pub fn new(backends: Vec<Box<dyn StorageBackend>>) -> Result<Self, StoreError> {
        init_tracing_once();
        if backends.is_empty() {
            return Err(StoreError::NoBackends);
        }

        let mut dts: Vec<String> = backends[0]
            .get_listing()?
            .into_iter()
            .filter(|p| prefix_regex().is_match(p))
            .collect();
        dts.sort();
        dts.reverse();

        if dts.is_empty() {
            return Err(StoreError::NoDayPrefixes);
        }
        tracing::debug!("found {} dts", dts.len());

        Ok(Self { backends, dts, idx: CommentsIndex::new() })
    }

    /// Assemble backends from options: local filesystem first (when enabled),
    /// then the object store (when a bucket is configured).
    pub fn from_options(opts: &StoreOptions) -> Result<Self, StoreError> {
        let mut backends: Vec<Box<dyn StorageBackend>> = Vec::new();
        if opts.use_local {
            backends.push(Box::new(LocalBackend::new(&opts.local_path)));
        }
        if let Some(bucket) = opts.bucket.as_deref() {
            backends.push(Box::new(ObjectStoreBackend::s3(bucket)?));
        }
        Self::new(backends)
    }

    pub fn index(&self) -> &CommentsIndex {
        &self.idx
    }

    /// The newest known day prefix.
    pub fn latest_dt_prefix(&self) -> &str {
        &self.dts[0]
    }

    /// The newest known day.
    pub fn latest_dt_date(&self) -> Date {
        // Discovery only admits prefixes matching the day pattern.
        parse_dt_prefix(&self.dts[0]).expect("discovered prefixes are day-shaped")
    }

    /// Format a day's storage prefix, defaulting to the latest available day.
    pub fn get_dt_prefix(&self, dt_date: Option<Date>) -> String {
        match dt_date {
            Some(d) => dt_prefix(d),
            None => self.latest_dt_prefix().to_string(),
        }
    }

    /// N consecutive thread days ending at `date_from` (default: latest
    /// available), newest first. Answers "comments from the last N days".
    pub fn get_dt_dates(&self, daysago: i64, date_from: Option<Date>) -> Vec<Date> {
        let from = date_from.unwrap_or_else(|| self.latest_dt_date());
        dt_dates_ending_at(daysago, from)
    }

    /// Age of a blob in seconds. Naively uses the first backend's answer.
    pub fn get_age(&self, prefix: &str, key: &str) -> Result<u64, StoreError> {
        Ok(self.backends[0].get_age(prefix, key)?)
    }

    /// Read a blob, quietly trying backends in order until one has it.
    /// Per-backend misses and decode failures are logged and skipped;
    /// anything else (I/O, remote faults) propagates. Only when every
    /// backend missed does the read fail with `NotFound`.
    pub fn read(&self, prefix: &str, key: &str) -> Result<Value, StoreError> {
        for backend in &self.backends {
            match backend.read(prefix, key) {
                Ok(value) => return Ok(value),
                Err(BackendError::NotFound { .. }) => {
                    tracing::warn!("file not found in {}: {prefix}/{key}", backend.name());
                }
                Err(e @ BackendError::Decode { .. }) => {
                    tracing::error!("error decoding {prefix}/{key} from {}: {e}", backend.name());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::NotFound { prefix: prefix.to_string(), key: key.to_string() })
    }

    /// Write named blobs to every configured backend. A failing backend is
    /// logged and must not prevent attempting the others; there is no
    /// rollback.
    pub fn write(&self, prefix: &str, blobs: &[(&str, &Value)]) {
        for backend in &self.backends {
            if let Err(e) = backend.write(prefix, blobs) {
                tracing::error!("write to {} failed for {prefix}: {e}", backend.name());
            }
        }
    }

    /// Load and index a day's comments if that day hasn't been indexed yet.
    pub fn update_index(&mut self, dt_date: Date) -> Result<(), StoreError> {
        if self.idx.has_day(dt_date) {
            return Ok(());
        }
        let prefix = dt_prefix(dt_date);
        let value = self.read(&prefix, COMMENTS_KEY)?;
        let comments: Vec<Comment> =
            serde_json::from_value(value).map_err(|source| BackendError::Decode {
                prefix,
                key: COMMENTS_KEY.to_string(),
                source,
            })?;
        self.idx.index_comments(comments);
        Ok(())
    }

    fn day_comment_ids(&self, dt_date: Date, username: Option<&str>) -> Vec<String> {
        let day_ids = self.idx.day_ids(dt_date);
        match username {
            None => day_ids.to_vec(),
            Some(user) => {
                let by_author: AHashSet<&String> = self.idx.author_ids(user).iter().collect();
                day_ids.iter().filter(|id| by_author.contains(id)).cloned().collect()
            }
        }
    }

    /// Comments from one or more days, optionally filtered by author. Days
    /// with no stored comments are logged and skipped.
    pub fn read_comments(&mut self, dt_dates: &[Date], username: Option<&str>) -> Vec<Comment> {
        let mut out = Vec::new();
        for &dt_date in dt_dates {
            if let Err(e) = self.update_index(dt_date) {
                tracing::warn!("no comments found for {}: {e}", dt_prefix(dt_date));
                continue;
            }
            let ids = self.day_comment_ids(dt_date, username);
            out.extend(self.idx.get_by_ids(ids.iter()).into_iter().cloned());
        }
        out
    }

    /// Threads from one or more days, optionally filtered by author.
    ///
    /// Deduped aggressively: once a thread is emitted, every comment id it
    /// covers is marked processed so later candidates inside the same
    /// conversation don't rebuild (and re-yield) it once per descendant. A
    /// comment with a corrupt parent chain is logged, marked processed, and
    /// skipped — it never aborts the rest of the day.
    pub fn read_threads(&mut self, dt_dates: &[Date], username: Option<&str>) -> Vec<Thread> {
        let mut threads = Vec::new();
        let mut processed: AHashSet<String> = AHashSet::new();

        for &dt_date in dt_dates {
            if let Err(e) = self.update_index(dt_date) {
                tracing::warn!("no comments found for {}: {e}", dt_prefix(dt_date));
                continue;
            }
            for comment_id in self.day_comment_ids(dt_date, username) {
                if processed.contains(&comment_id) {
                    continue;
                }
                let Some(comment) = self.idx.get(&comment_id) else { continue };
                match self.idx.get_thread(comment) {
                    Ok(thread) => {
                        processed.extend(thread.get_comment_ids());
                        threads.push(thread);
                    }
                    Err(e) => {
                        tracing::warn!("skipping comment {comment_id}: {e}");
                        processed.insert(comment_id);
                    }
                }
            }
        }
        threads
    }

    /// The single thread containing `comment_id` on the given day.
    pub fn read_thread(&mut self, comment_id: &str, dt_date: Date) -> Result<Thread, StoreError> {
        self.update_index(dt_date)?;
        let comment = self
            .idx
            .get(comment_id)
            .ok_or_else(|| StoreError::UnknownCommentId(comment_id.to_string()))?;
        Ok(self.idx.get_thread(comment)?)
    }

    /// Manual backfill: resolve missing parent_ids through the platform
    /// collaborator (bounded retry/backoff per call), then rewrite the day's
    /// comments blob to every backend. Returns the number of backfilled ids.
    pub fn update_parent_ids(
        &mut self,
        lookup: &dyn ParentLookup,
        dt_date: Option<Date>,
    ) -> Result<usize, StoreError> {
        let dt_date = dt_date.unwrap_or_else(|| self.latest_dt_date());
        let prefix = dt_prefix(dt_date);
        tracing::info!("updating parent_ids for {prefix}...");

        let mut comments = self.read_comments(&[dt_date], None);
        let pb = ProgressBar::new(comments.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message(format!("backfilling {prefix}"));

        let mut updated = 0usize;
        for comment in comments.iter_mut() {
            if let Some(parent_id) = comment.parent_id.as_deref() {
                tracing::debug!("comment {} already has a parent_id: {parent_id}", comment.id);
                pb.inc(1);
                continue;
            }
            match retry_with_backoff(3, 250, || lookup.get_parent_id(&comment.id)) {
                Ok(Some(parent_id)) => {
                    comment.parent_id = Some(parent_id);
                    updated += 1;
                }
                Ok(None) => {
                    tracing::warn!("no parent id found for {}. this should never happen.", comment.id);
                }
                Err(e) => {
                    tracing::error!("parent lookup failed for {}: {e}", comment.id);
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("backfilled {updated} parent ids"));

        if updated > 0 {
            let value = serde_json::to_value(&comments).map_err(|source| BackendError::Decode {
                prefix: prefix.clone(),
                key: COMMENTS_KEY.to_string(),
                source,
            })?;
            self.write(&prefix, &[(COMMENTS_KEY, &value)]);
        }
        tracing::info!("done: {} comments", comments.len());
        Ok(updated)
    }
}
