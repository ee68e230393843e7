use crate::backend::{BackendError, StorageBackend};
use crate::util::now;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde_json::Value;
use std::sync::Arc;

/// Remote object-store backend. Wraps any `ObjectStore` implementation and
/// drives it through a private current-thread runtime so the `StorageBackend`
/// contract stays synchronous; callers own retry/timeout policy.
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    rt: tokio::runtime::Runtime,
    label: String,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>, label: impl Into<String>) -> Result<Self, BackendError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { store, rt, label: label.into() })
    }

    /// S3 backend on `bucket`, credentials and region from the environment.
    pub fn s3(bucket: &str) -> Result<Self, BackendError> {
        if bucket.trim().is_empty() {
            return Err(BackendError::Misconfigured("bucket not set".to_string()));
        }
        let s3 = AmazonS3Builder::from_env().with_bucket_name(bucket).build()?;
        Self::new(Arc::new(s3), format!("s3://{bucket}"))
    }

    fn blob_path(prefix: &str, key: &str) -> ObjectPath {
        ObjectPath::from(format!("{prefix}/{key}.json"))
    }

    fn map_not_found(prefix: &str, key: &str, e: object_store::Error) -> BackendError {
        match e {
            object_store::Error::NotFound { .. } => BackendError::NotFound {
                prefix: prefix.to_string(),
                key: key.to_string(),
            },
            e => BackendError::ObjectStore(e),
        }
    }
}

impl StorageBackend for ObjectStoreBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn write(&self, prefix: &str, blobs: &[(&str, &Value)]) -> Result<(), BackendError> {
        for (key, value) in blobs {
            let path = Self::blob_path(prefix, key);
            tracing::debug!("writing to {path}");
            let buf = serde_json::to_vec(value).map_err(|source| BackendError::Decode {
                prefix: prefix.to_string(),
                key: key.to_string(),
                source,
            })?;
            self.rt
                .block_on(self.store.put(&path, Bytes::from(buf)))
                .map_err(BackendError::ObjectStore)?;
        }
        Ok(())
    }

    fn read(&self, prefix: &str, key: &str) -> Result<Value, BackendError> {
        let path = Self::blob_path(prefix, key);
        tracing::debug!("reading from {path}");
        let raw = self
            .rt
            .block_on(async { self.store.get(&path).await?.bytes().await })
            .map_err(|e| Self::map_not_found(prefix, key, e))?;
        serde_json::from_slice(&raw).map_err(|source| BackendError::Decode {
            prefix: prefix.to_string(),
            key: key.to_string(),
            source,
        })
    }

    fn get_listing(&self) -> Result<Vec<String>, BackendError> {
        let listing = self
            .rt
            .block_on(self.store.list_with_delimiter(None))
            .map_err(BackendError::ObjectStore)?;
        Ok(listing
            .common_prefixes
            .iter()
            .map(|p| p.as_ref().to_string())
            .collect())
    }

    fn get_age(&self, prefix: &str, key: &str) -> Result<u64, BackendError> {
        let path = Self::blob_path(prefix, key);
        let meta = self
            .rt
            .block_on(self.store.head(&path))
            .map_err(|e| Self::map_not_found(prefix, key, e))?;
        let modified = meta.last_modified.timestamp();
        Ok((now() - modified).max(0) as u64)
    }
}
