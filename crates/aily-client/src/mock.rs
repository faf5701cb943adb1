//! Scripted transport for tests.
//!
//! Responses are queued per `(method, path)` route and returned in order.
//! The last queued response of a route is sticky so polling loops can be
//! scripted without counting attempts. Every request is logged.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, Transport};

/// A scripted reply: an envelope, or a rejection with a message.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Resolve with this envelope.
    Envelope(Envelope),
    /// Reject with [`Error::Transport`].
    Reject(String),
}

/// Transport returning pre-configured replies.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    request_log: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub fn push(&self, method: Method, path: impl Into<String>, reply: MockReply) -> &Self {
        self.lock_routes()
            .entry((method, path.into()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a successful envelope carrying `data`.
    pub fn ok(&self, method: Method, path: impl Into<String>, data: Value) -> &Self {
        self.push(method, path, MockReply::Envelope(Envelope::ok(data)))
    }

    /// Queue an envelope with a non-zero code.
    pub fn fail(&self, method: Method, path: impl Into<String>, code: i64, msg: &str) -> &Self {
        self.push(method, path, MockReply::Envelope(Envelope::failure(code, msg)))
    }

    /// Queue a rejection.
    pub fn reject(&self, method: Method, path: impl Into<String>, reason: &str) -> &Self {
        self.push(method, path, MockReply::Reject(reason.to_string()))
    }

    /// Get all requests made so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.request_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Count requests made to `method path`.
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<(Method, String), VecDeque<MockReply>>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Envelope> {
        let key = (request.method.clone(), request.path.clone());
        self.request_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let reply = {
            let mut routes = self.lock_routes();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(MockReply::Envelope(envelope)) => Ok(envelope),
            Some(MockReply::Reject(reason)) => Err(Error::Transport(reason)),
            None => Err(Error::Transport(format!(
                "MockTransport: no reply for {} {}",
                key.0, key.1
            ))),
        }
    }
}
