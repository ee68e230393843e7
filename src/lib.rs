mod config;
mod date;
mod models;
mod util;

mod backend;
mod local;
mod memory;
mod object;

mod index;
mod thread;
mod store;

mod harvest;
mod keywords;
mod stats;
mod userstats;

pub use crate::config::{
    default_excluded_authors, merge_extra_exclusions, StoreOptions, COMMENTS_KEY, DT_CREATE_HOUR,
    FULLSTATS_KEY, KEYWORDS_KEY, SHORTSTATS_KEY, USERSTATS_PREFIX,
};
pub use crate::date::{dt_dates_ending_at, dt_prefix, parse_dt_prefix, target_dt_date};
pub use crate::models::Comment;

// Storage backends and the capability trait they all satisfy.
pub use crate::backend::{BackendError, StorageBackend};
pub use crate::local::LocalBackend;
pub use crate::memory::MemoryBackend;
pub use crate::object::ObjectStoreBackend;

// The comment store, index, and reply-tree types.
pub use crate::index::{CommentsIndex, IndexError};
pub use crate::store::{ParentLookup, StatsStore, StoreError};
pub use crate::thread::Thread;

// Harvesting and the derived-stats producers.
pub use crate::harvest::{harvest_comments, RawComment};
pub use crate::keywords::{compute_keywords, process_keywords, KeywordReport};
pub use crate::stats::{build_short_stats, compute_full_stats, process_stats, FullStats};
pub use crate::userstats::{get_span, process_userstats, UserStatsResults};

// Expose tracing/backoff helpers so binaries can import from the crate root.
pub use crate::util::{init_tracing_once, neuter_ping, now, retry_with_backoff};
