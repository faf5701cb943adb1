//! Non-destructive record merging.
//!
//! A [`RecordPatch`] distinguishes "leave this field alone" (`None`) from
//! "set this field" (`Some(value)`), which plain JSON cannot express. Merging
//! never mutates the existing record; it always produces a fresh one.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A stored record: a JSON object.
pub type Record = Map<String, Value>;

/// An incoming write. `None` values are undefined and never erase anything.
pub type RecordPatch = BTreeMap<String, Option<Value>>;

/// Merge `incoming` over `existing`, returning a new record.
///
/// - `None` leaves the existing value for that key untouched.
/// - An object written over an existing object is merged recursively.
/// - Any other value replaces the existing one.
/// - Keys absent from `incoming` are untouched.
pub fn merge(existing: &Record, incoming: &RecordPatch) -> Record {
    let mut result = existing.clone();

    for (key, value) in incoming {
        let Some(value) = value else {
            continue;
        };

        let merged = match (result.get(key), value) {
            (Some(Value::Object(current)), Value::Object(next)) => {
                Value::Object(merge_objects(current, next))
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    result
}

/// Deep merge of two plain JSON objects (nested values are always defined).
fn merge_objects(existing: &Record, incoming: &Record) -> Record {
    let mut result = existing.clone();

    for (key, value) in incoming {
        let merged = match (result.get(key), value) {
            (Some(Value::Object(current)), Value::Object(next)) => {
                Value::Object(merge_objects(current, next))
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    result
}

/// Turn a full record into a patch that sets every field.
pub fn patch_from(record: Record) -> RecordPatch {
    record.into_iter().map(|(k, v)| (k, Some(v))).collect()
}

/// Fluent builder for [`RecordPatch`].
#[derive(Debug, Clone, Default)]
pub struct PatchBuilder {
    patch: RecordPatch,
}

impl PatchBuilder {
    /// Create an empty patch builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.patch.insert(key.into(), Some(value.into()));
        self
    }

    /// Mention a field without a value; merging leaves it untouched.
    pub fn undefined(mut self, key: impl Into<String>) -> Self {
        self.patch.insert(key.into(), None);
        self
    }

    /// Finish the patch.
    pub fn build(self) -> RecordPatch {
        self.patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_undefined_keeps_existing() {
        let existing = record(json!({"a": 1}));
        let patch = PatchBuilder::new().undefined("a").build();

        assert_eq!(merge(&existing, &patch), existing);
    }

    #[test]
    fn test_defined_values_overwrite() {
        let existing = record(json!({"a": 1}));
        let patch = PatchBuilder::new().set("a", 2).set("b", 1).build();

        assert_eq!(merge(&existing, &patch), record(json!({"a": 2, "b": 1})));
    }

    #[test]
    fn test_absent_keys_untouched() {
        let existing = record(json!({"a": 1, "keep": "me"}));
        let patch = PatchBuilder::new().set("a", 5).build();

        let merged = merge(&existing, &patch);
        assert_eq!(merged["keep"], json!("me"));
        assert_eq!(merged["a"], json!(5));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let existing = record(json!({"outer": {"x": 1, "inner": {"y": 2}}}));
        let patch = PatchBuilder::new()
            .set("outer", json!({"inner": {"z": 3}}))
            .build();

        let merged = merge(&existing, &patch);
        assert_eq!(
            Value::Object(merged),
            json!({"outer": {"x": 1, "inner": {"y": 2, "z": 3}}})
        );
    }

    #[test]
    fn test_null_is_a_value() {
        let existing = record(json!({"a": 1}));
        let patch = PatchBuilder::new().set("a", Value::Null).build();

        assert_eq!(merge(&existing, &patch)["a"], Value::Null);
    }

    #[test]
    fn test_merge_does_not_alias_existing() {
        let existing = record(json!({"nested": {"a": 1}}));
        let patch = PatchBuilder::new().set("nested", json!({"b": 2})).build();

        let merged = merge(&existing, &patch);
        assert_eq!(Value::Object(existing), json!({"nested": {"a": 1}}));
        assert_eq!(Value::Object(merged), json!({"nested": {"a": 1, "b": 2}}));
    }

    #[test]
    fn test_patch_from_record() {
        let patch = patch_from(record(json!({"a": 1, "b": "two"})));
        assert_eq!(patch.get("a"), Some(&Some(json!(1))));
        assert_eq!(patch.get("b"), Some(&Some(json!("two"))));
    }
}
