use std::path::{Path, PathBuf};

/// Blob names shared among all modules; the storage layer adds the extension.
pub const COMMENTS_KEY: &str = "comments";
pub const FULLSTATS_KEY: &str = "full_stats";
pub const SHORTSTATS_KEY: &str = "short_stats";
pub const KEYWORDS_KEY: &str = "keywords";
pub const USERSTATS_PREFIX: &str = "userstats";

/// Hour of day (UTC) at which a new discussion thread is posted.
pub const DT_CREATE_HOUR: u8 = 7;

/// Returns a normalized (lowercase) default list of bot/service authors whose
/// comments are excluded from harvesting and stats.
pub fn default_excluded_authors() -> Vec<String> {
    let defaults = [
        "jobautomator",
        "automoderator",
        "emojifierbot",
        "emojifierbotv2",
        "groupbot",
        "tacostats",
        "shiversifybot",
        "sorobucksbot",
        "tacograph",
    ];
    let mut v: Vec<String> = defaults.iter().map(|s| s.to_lowercase()).collect();
    v.sort();
    v.dedup();
    v
}

/// Merge extra exclusions from env/file into the provided vector (in-place).
/// - DTSTATS_EXCLUDE_AUTHORS: comma/semicolon/space separated names
/// - DTSTATS_EXCLUDE_AUTHORS_FILE: path to newline-separated file of names
/// All entries are normalized (lowercase), then the list is sort+dedup.
pub fn merge_extra_exclusions(target: &mut Vec<String>) {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    if let Ok(s) = std::env::var("DTSTATS_EXCLUDE_AUTHORS") {
        for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            let n = raw.trim().to_lowercase();
            if !n.is_empty() {
                target.push(n);
            }
        }
    }

    if let Ok(path) = std::env::var("DTSTATS_EXCLUDE_AUTHORS_FILE") {
        if !path.trim().is_empty() {
            if let Ok(f) = File::open(&path) {
                let r = BufReader::new(f);
                for line in r.lines().flatten() {
                    let n = line.trim().to_lowercase();
                    if !n.is_empty() {
                        target.push(n);
                    }
                }
            } else {
                tracing::warn!("DTSTATS_EXCLUDE_AUTHORS_FILE is set but cannot be opened: {}", path);
            }
        }
    }

    for s in target.iter_mut() {
        *s = s.trim().to_lowercase();
    }
    target.sort();
    target.dedup();
}

/// User-facing store options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    pub use_local: bool,           // enable the local-filesystem backend
    pub local_path: PathBuf,       // root directory for the local backend
    pub bucket: Option<String>,    // enable the object-store backend when set
    pub create_hour: u8,           // UTC hour a new discussion thread appears
    pub userstats_history: i64,    // how many days back userstats looks
    pub use_cache: bool,           // reuse day-fresh userstats results
    pub excluded_authors: Vec<String>, // normalized lowercase
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            use_local: true,
            local_path: PathBuf::from(".local_stats"),
            bucket: None,
            create_hour: DT_CREATE_HOUR,
            userstats_history: 7,
            use_cache: false,
            excluded_authors: default_excluded_authors(),
        }
    }
}

impl StoreOptions {
    /// Build options from the environment: DTSTATS_USE_LOCAL, DTSTATS_LOCAL_PATH,
    /// DTSTATS_BUCKET, DTSTATS_USERSTATS_HISTORY, DTSTATS_USE_CACHE, plus the
    /// exclusion merges documented on `merge_extra_exclusions`.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(v) = std::env::var("DTSTATS_USE_LOCAL") {
            opts.use_local = parse_bool(&v);
        }
        if let Ok(p) = std::env::var("DTSTATS_LOCAL_PATH") {
            if !p.trim().is_empty() {
                opts.local_path = PathBuf::from(p);
            }
        }
        if let Ok(b) = std::env::var("DTSTATS_BUCKET") {
            if !b.trim().is_empty() {
                opts.bucket = Some(b);
            }
        }
        if let Ok(n) = std::env::var("DTSTATS_USERSTATS_HISTORY") {
            if let Ok(days) = n.parse::<i64>() {
                opts.userstats_history = days.max(1);
            }
        }
        if let Ok(v) = std::env::var("DTSTATS_USE_CACHE") {
            opts.use_cache = parse_bool(&v);
        }
        merge_extra_exclusions(&mut opts.excluded_authors);
        opts
    }

    pub fn with_local_path(mut self, path: impl AsRef<Path>) -> Self {
        self.local_path = path.as_ref().to_path_buf();
        self.use_local = true;
        self
    }
    pub fn with_use_local(mut self, yes: bool) -> Self {
        self.use_local = yes;
        self
    }
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
    pub fn with_create_hour(mut self, hour: u8) -> Self {
        self.create_hour = hour.min(23);
        self
    }
    pub fn with_userstats_history(mut self, days: i64) -> Self {
        self.userstats_history = days.max(1);
        self
    }
    pub fn with_use_cache(mut self, yes: bool) -> Self {
        self.use_cache = yes;
        self
    }
    pub fn with_excluded_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_authors = authors.into_iter().map(|s| s.as_ref().trim().to_lowercase()).collect();
        self.excluded_authors.sort();
        self.excluded_authors.dedup();
        self
    }

    /// True when the author is on the exclusion list (names are stored lowercase).
    pub fn is_excluded(&self, author: &str) -> bool {
        self.excluded_authors.binary_search(&author.to_lowercase()).is_ok()
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
