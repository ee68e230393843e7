use crate::config::COMMENTS_KEY;
use crate::models::Comment;
use serde_json::Value;

/// Error taxonomy for a single storage backend. `NotFound` and `Decode` are
/// recoverable by the store's ordered fallback; everything else propagates.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not found: {prefix}/{key}")]
    NotFound { prefix: String, key: String },

    #[error("error decoding {prefix}/{key}: {source}")]
    Decode {
        prefix: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("backend misconfigured: {0}")]
    Misconfigured(String),
}

/// A key/value JSON blob store keyed by (day-prefix, name). Concrete
/// implementations (local filesystem, remote object store, in-memory) satisfy
/// identical contracts so the comment store can try them in priority order
/// and tests can substitute doubles.
pub trait StorageBackend {
    /// Label used in log lines when a read falls through this backend.
    fn name(&self) -> &str;

    /// Persist each named blob as JSON under `<prefix>/<name>.json`.
    /// Overwrites unconditionally.
    fn write(&self, prefix: &str, blobs: &[(&str, &Value)]) -> Result<(), BackendError>;

    /// Parsed JSON for `<prefix>/<key>.json`, or `NotFound` when absent.
    fn read(&self, prefix: &str, key: &str) -> Result<Value, BackendError>;

    /// All known top-level prefixes (used to discover available days).
    fn get_listing(&self) -> Result<Vec<String>, BackendError>;

    /// Seconds since `<prefix>/<key>.json` was last modified.
    fn get_age(&self, prefix: &str, key: &str) -> Result<u64, BackendError>;

    /// The day's comments blob decoded into records.
    fn read_comments(&self, prefix: &str) -> Result<Vec<Comment>, BackendError> {
        let value = self.read(prefix, COMMENTS_KEY)?;
        serde_json::from_value(value).map_err(|source| BackendError::Decode {
            prefix: prefix.to_string(),
            key: COMMENTS_KEY.to_string(),
            source,
        })
    }
}
