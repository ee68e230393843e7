use crate::backend::{BackendError, StorageBackend};
use crate::util::now;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Local-filesystem backend: blobs live at `<root>/<prefix>/<name>.json`.
pub struct LocalBackend {
    root: PathBuf,
    label: String,
}

impl LocalBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let label = format!("local:{}", root.display());
        Self { root, label }
    }

    fn blob_path(&self, prefix: &str, key: &str) -> PathBuf {
        self.root.join(prefix).join(format!("{key}.json"))
    }
}

impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn write(&self, prefix: &str, blobs: &[(&str, &Value)]) -> Result<(), BackendError> {
        let parent = self.root.join(prefix);
        fs::create_dir_all(&parent)?;
        for (key, value) in blobs {
            let path = parent.join(format!("{key}.json"));
            tracing::debug!("writing to {}", path.display());
            let buf = serde_json::to_vec(value).map_err(|source| BackendError::Decode {
                prefix: prefix.to_string(),
                key: key.to_string(),
                source,
            })?;
            fs::write(&path, buf)?;
        }
        Ok(())
    }

    fn read(&self, prefix: &str, key: &str) -> Result<Value, BackendError> {
        let path = self.blob_path(prefix, key);
        tracing::debug!("reading from {}", path.display());
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound {
                    prefix: prefix.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|source| BackendError::Decode {
            prefix: prefix.to_string(),
            key: key.to_string(),
            source,
        })
    }

    fn get_listing(&self) -> Result<Vec<String>, BackendError> {
        let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
        let mut prefixes = Vec::new();
        if !self.root.exists() {
            return Ok(prefixes);
        }
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let ent = match entry {
                Ok(ent) => ent,
                Err(_) => continue,
            };
            if !ent.file_type().is_dir() {
                continue;
            }
            if let Some(name) = ent.file_name().to_str() {
                if re.is_match(name) {
                    prefixes.push(name.to_string());
                }
            }
        }
        Ok(prefixes)
    }

    fn get_age(&self, prefix: &str, key: &str) -> Result<u64, BackendError> {
        let path = self.blob_path(prefix, key);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound {
                    prefix: prefix.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let modified = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok((now() - modified).max(0) as u64)
    }
}
