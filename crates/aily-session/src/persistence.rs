//! JSON-file backed record cache.
//!
//! The whole cache is one JSON object keyed by cache key. It is read once at
//! open and rewritten on every successful `set`, through a temporary file
//! renamed over the target so a crash never leaves a truncated file behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::cache::RecordCache;
use crate::error::{Error, Result};
use crate::merge::{Record, RecordPatch, merge};

/// Record cache persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRecordCache {
    path: PathBuf,
    inner: Arc<RwLock<HashMap<String, Record>>>,
}

impl JsonFileRecordCache {
    /// Open the cache at `path`, loading existing contents if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        debug!(path = %path.display(), keys = records.len(), "Record cache opened");

        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(records)),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_all(&self, records: &HashMap<String, Record>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Io {
                        path: parent.display().to_string(),
                        source: e,
                    })?;
            }
        }

        let contents = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| Error::Io {
                path: tmp.display().to_string(),
                source: e,
            })?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::Io {
                path: self.path.display().to_string(),
                source: e,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordCache for JsonFileRecordCache {
    async fn get(&self, key: &str) -> Option<Record> {
        self.inner.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: RecordPatch) -> bool {
        let mut inner = self.inner.write().await;
        let current = inner.get(key).cloned().unwrap_or_default();

        let mut next = inner.clone();
        next.insert(key.to_string(), merge(&current, &value));

        match self.write_all(&next).await {
            Ok(()) => {
                *inner = next;
                true
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to persist record cache");
                false
            }
        }
    }
}
