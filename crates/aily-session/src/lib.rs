//! Session record cache with merge-on-write semantics.
//!
//! This crate provides the small key/value store the completion pipeline
//! uses to remember which server session belongs to a caller-chosen key:
//! - A pure, non-destructive [`merge`] over JSON records
//! - The [`RecordCache`] trait with in-memory and JSON-file implementations
//! - [`SessionRecords`], a typed handle over the session mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aily_session::{MemoryRecordCache, SessionRecords};
//!
//! let records = SessionRecords::new(Arc::new(MemoryRecordCache::new()));
//! records.insert("support-chat", "session_7f3a").await;
//! assert_eq!(records.session_id("support-chat").await.as_deref(), Some("session_7f3a"));
//! ```

mod cache;
mod error;
mod merge;
mod persistence;
mod records;

pub use cache::{MemoryRecordCache, RecordCache, SharedRecordCache};
pub use error::{Error, Result};
pub use merge::{PatchBuilder, Record, RecordPatch, merge, patch_from};
pub use persistence::JsonFileRecordCache;
pub use records::{SESSION_RECORDS_KEY, SessionRecords};
