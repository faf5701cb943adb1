//! The `{code, msg, data}` wrapper returned by every endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Response envelope. `code == 0` means success.
///
/// A decoded envelope says nothing about logical success: check
/// [`Envelope::is_success`] and the presence of `data` before using it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    /// Result code, 0 on success.
    #[serde(default)]
    pub code: i64,
    /// Human readable message.
    #[serde(default)]
    pub msg: String,
    /// Payload, absent on most failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Build a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    /// Build a failed envelope without data.
    pub fn failure(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    /// True when the code is 0.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Payload of a successful envelope.
    pub fn into_data(self) -> Option<T> {
        if self.is_success() { self.data } else { None }
    }
}

impl Envelope<Value> {
    /// Decode the raw payload into a typed envelope.
    ///
    /// A `null` payload decodes to `data: None`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Envelope<T>> {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        Ok(Envelope {
            code: self.code,
            msg: self.msg,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        id: String,
    }

    #[test]
    fn test_parse_success() {
        let env: Envelope = serde_json::from_value(json!({
            "code": 0, "msg": "success", "data": {"id": "x"}
        }))
        .unwrap();
        assert!(env.is_success());

        let typed: Envelope<Payload> = env.decode().unwrap();
        assert_eq!(typed.into_data(), Some(Payload { id: "x".into() }));
    }

    #[test]
    fn test_parse_failure_without_data() {
        let env: Envelope = serde_json::from_value(json!({
            "code": 2200, "msg": "internal error"
        }))
        .unwrap();
        assert!(!env.is_success());
        assert!(env.data.is_none());
    }

    #[test]
    fn test_into_data_ignores_payload_on_failure() {
        let env = Envelope {
            code: 1,
            msg: "bad".into(),
            data: Some(json!({"id": "x"})),
        };
        assert_eq!(env.into_data(), None);
    }

    #[test]
    fn test_decode_null_data() {
        let env: Envelope = serde_json::from_value(json!({"code": 0, "msg": "", "data": null}))
            .unwrap();
        let typed: Envelope<Payload> = env.decode().unwrap();
        assert!(typed.data.is_none());
    }
}
