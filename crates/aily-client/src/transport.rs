//! The single-call HTTP contract every endpoint goes through.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::error::Result;

/// One API call: method, path, query parameters, body and headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL, with path parameters substituted.
    pub path: String,
    /// Query parameters.
    pub params: Map<String, Value>,
    /// JSON body.
    pub data: Option<Value>,
    /// Extra headers for this call.
    pub headers: HashMap<String, String>,
}

impl ApiRequest {
    /// Create a request with no parameters, body, or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Map::new(),
            data: None,
            headers: HashMap::new(),
        }
    }

    /// Set the query parameters.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Set the JSON body.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Apply per-call options.
    pub fn with_options(mut self, options: &RequestOptions) -> Self {
        self.headers
            .extend(options.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Per-call options accepted by every endpoint method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers sent with the call.
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Executes one API call and decodes the envelope.
///
/// Implementations reject (return `Err`) when no envelope could be obtained:
/// network failures, non-success HTTP statuses, undecodable bodies. A
/// decoded envelope with a non-zero code is still `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request.
    async fn send(&self, request: ApiRequest) -> Result<Envelope>;
}

/// A transport that can be shared across clones of the client.
pub type SharedTransport = Arc<dyn Transport>;

/// Drop falsy parameters: `null`, `false`, `0`, and `""`.
pub fn compact_params(params: Map<String, Value>) -> Map<String, Value> {
    params.into_iter().filter(|(_, v)| !is_falsy(v)).collect()
}

pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compact_params_drops_falsy() {
        let params = match json!({
            "page_size": 20,
            "page_token": "",
            "zero": 0,
            "off": false,
            "nothing": null,
            "on": true,
            "ids": [],
            "run_id": "run_1"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let compact = compact_params(params);
        let mut keys: Vec<_> = compact.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["ids", "on", "page_size", "run_id"]);
    }

    #[test]
    fn test_with_options_merges_headers() {
        let options = RequestOptions::new().header("X-Trace", "abc");
        let request = ApiRequest::new(Method::GET, "open-apis/aily/v1/sessions/s1")
            .with_options(&options);
        assert_eq!(request.headers.get("X-Trace").map(String::as_str), Some("abc"));
    }
}
