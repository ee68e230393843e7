use crate::backend::{BackendError, StorageBackend};
use crate::util::now;
use ahash::AHashMap;
use parking_lot::Mutex;
use serde_json::Value;

struct Entry {
    value: Value,
    written_at: i64,
}

/// In-process backend keyed by (prefix, name). The cheapest way to run the
/// full store against fixture data, and a first-class backend in its own
/// right for short-lived batch runs.
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<AHashMap<(String, String), Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, prefix: &str, blobs: &[(&str, &Value)]) -> Result<(), BackendError> {
        let mut map = self.blobs.lock();
        for (key, value) in blobs {
            map.insert(
                (prefix.to_string(), key.to_string()),
                Entry { value: (*value).clone(), written_at: now() },
            );
        }
        Ok(())
    }

    fn read(&self, prefix: &str, key: &str) -> Result<Value, BackendError> {
        let map = self.blobs.lock();
        map.get(&(prefix.to_string(), key.to_string()))
            .map(|e| e.value.clone())
            .ok_or_else(|| BackendError::NotFound {
                prefix: prefix.to_string(),
                key: key.to_string(),
            })
    }

    fn get_listing(&self) -> Result<Vec<String>, BackendError> {
        let map = self.blobs.lock();
        let mut prefixes: Vec<String> = map.keys().map(|(p, _)| p.clone()).collect();
        prefixes.sort();
        prefixes.dedup();
        Ok(prefixes)
    }

    fn get_age(&self, prefix: &str, key: &str) -> Result<u64, BackendError> {
        let map = self.blobs.lock();
        map.get(&(prefix.to_string(), key.to_string()))
            .map(|e| (now() - e.written_at).max(0) as u64)
            .ok_or_else(|| BackendError::NotFound {
                prefix: prefix.to_string(),
                key: key.to_string(),
            })
    }
}
