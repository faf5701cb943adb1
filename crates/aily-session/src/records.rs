//! Session key → session id mapping on top of a [`RecordCache`].

use serde_json::Value;
use tracing::debug;

use crate::cache::SharedRecordCache;
use crate::merge::{Record, RecordPatch};

/// Cache key under which session records are stored by default.
pub const SESSION_RECORDS_KEY: &str = "aily.session_records";

/// Handle over the session records stored in a cache.
///
/// All session keys live in a single record, so writes for one key never
/// disturb the others.
#[derive(Clone)]
pub struct SessionRecords {
    cache: SharedRecordCache,
    key: String,
}

impl SessionRecords {
    /// Create a handle using the default cache key.
    pub fn new(cache: SharedRecordCache) -> Self {
        Self::with_key(cache, SESSION_RECORDS_KEY)
    }

    /// Create a handle storing records under a custom cache key.
    pub fn with_key(cache: SharedRecordCache, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
        }
    }

    /// Get the full mapping (empty when nothing was recorded yet).
    pub async fn get(&self) -> Record {
        self.cache.get(&self.key).await.unwrap_or_default()
    }

    /// Look up the session id recorded for `session_key`.
    pub async fn session_id(&self, session_key: &str) -> Option<String> {
        let records = self.cache.get(&self.key).await?;
        match records.get(session_key) {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            _ => None,
        }
    }

    /// Merge `records` into the stored mapping.
    pub async fn update(&self, records: RecordPatch) -> bool {
        debug!(count = records.len(), "Updating session records");
        self.cache.set(&self.key, records).await
    }

    /// Record a single `session_key` → `session_id` mapping.
    pub async fn insert(&self, session_key: &str, session_id: &str) -> bool {
        let mut patch = RecordPatch::new();
        patch.insert(
            session_key.to_string(),
            Some(Value::String(session_id.to_string())),
        );
        self.update(patch).await
    }
}

impl std::fmt::Debug for SessionRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecords")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
