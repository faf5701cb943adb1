//! Record cache trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use crate::merge::{Record, RecordPatch, merge};

/// Keyed store of small JSON records with merge-on-write semantics.
///
/// `set` merges the patch into whatever is stored under the key (an empty
/// record when nothing is) instead of replacing it. Implementations must
/// tolerate concurrent `get`/`set` calls on unrelated keys.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Get the record stored under `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Option<Record>;

    /// Merge `value` into the record under `key` and persist the result.
    ///
    /// Returns `false` when the merged record could not be persisted.
    async fn set(&self, key: &str, value: RecordPatch) -> bool;
}

/// A cache that can be shared across tasks.
pub type SharedRecordCache = Arc<dyn RecordCache>;

/// Process-local record cache. Contents live as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordCache {
    inner: Arc<RwLock<HashMap<String, Record>>>,
}

impl MemoryRecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of keys stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn get(&self, key: &str) -> Option<Record> {
        self.inner.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: RecordPatch) -> bool {
        let mut inner = self.inner.write().await;
        let current = inner.get(key).cloned().unwrap_or_default();
        let merged = merge(&current, &value);
        trace!(key = %key, fields = merged.len(), "Record merged into cache");
        inner.insert(key.to_string(), merged);
        true
    }
}
