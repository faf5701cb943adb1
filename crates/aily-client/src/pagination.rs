//! Cursor pagination shared by every list endpoint.
//!
//! A [`PageIterator`] turns a single-page fetch into a lazy, forward-only
//! sequence of page payloads. Each call to [`PageIterator::next_page`]
//! performs exactly one request; nothing is fetched ahead.
//!
//! Items are `Option<T>`: `Some(page)` for a page (with `has_more`,
//! `page_token` and `next_page_token` removed), `None` as a failure sentinel
//! after which the sequence ends. Errors never escape the iterator.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;

use futures::Stream;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::transport::{compact_params, is_falsy};

/// Pagination fields removed from every yielded page.
pub const PAGINATION_FIELDS: [&str; 3] = ["has_more", "page_token", "next_page_token"];

/// Inputs of a single page fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Query parameters, cursor included.
    pub params: Map<String, Value>,
    /// Request body.
    pub data: Option<Value>,
    /// Extra headers.
    pub headers: HashMap<String, String>,
}

/// Boxed single-page fetch function.
pub type PageFetcher = Box<dyn FnMut(PageRequest) -> BoxFuture<'static, Result<Envelope>> + Send>;

/// Lazy, non-restartable sequence of pages.
///
/// Construct a new iterator to paginate again from the start.
pub struct PageIterator<T = Map<String, Value>> {
    fetch: PageFetcher,
    params: Map<String, Value>,
    data: Option<Value>,
    headers: HashMap<String, String>,
    has_more: bool,
    page_token: Option<String>,
    pages: usize,
    _page: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PageIterator<T> {
    /// Create an iterator over `fetch`, starting from `request`.
    ///
    /// A `page_token` in the initial parameters is used as the starting
    /// cursor.
    pub fn new<F, Fut>(mut fetch: F, request: PageRequest) -> Self
    where
        F: FnMut(PageRequest) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Envelope>> + Send + 'static,
    {
        let PageRequest {
            mut params,
            data,
            headers,
        } = request;
        let page_token = params.remove("page_token").and_then(cursor_value);

        Self {
            fetch: Box::new(move |req| -> BoxFuture<'static, Result<Envelope>> {
                Box::pin(fetch(req))
            }),
            params,
            data,
            headers,
            has_more: true,
            page_token,
            pages: 0,
            _page: PhantomData,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the sequence is over, `Some(None)` for the
    /// failure sentinel, and `Some(Some(page))` otherwise.
    pub async fn next_page(&mut self) -> Option<Option<T>> {
        if !self.has_more {
            return None;
        }

        let mut params = self.params.clone();
        if let Some(token) = &self.page_token {
            params.insert("page_token".to_string(), Value::String(token.clone()));
        }
        let request = PageRequest {
            params: compact_params(params),
            data: self.data.clone(),
            headers: self.headers.clone(),
        };

        let envelope = match (self.fetch)(request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(page = self.pages + 1, error = %e, "Page fetch failed");
                return Some(self.fail());
            }
        };

        if !envelope.is_success() {
            error!(
                page = self.pages + 1,
                code = envelope.code,
                msg = %envelope.msg,
                "Page fetch returned an error envelope"
            );
            return Some(self.fail());
        }

        let mut payload = match envelope.data {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                error!(page = self.pages + 1, data = %other, "Page payload is not an object");
                return Some(self.fail());
            }
        };

        let has_more = payload.remove("has_more").is_some_and(|v| !is_falsy(&v));
        let page_token = payload.remove("page_token").and_then(cursor_value);
        let next_page_token = payload.remove("next_page_token").and_then(cursor_value);
        let cursor = page_token.or(next_page_token);

        let page = match serde_json::from_value::<T>(Value::Object(payload)) {
            Ok(page) => page,
            Err(e) => {
                error!(page = self.pages + 1, error = %e, "Failed to decode page");
                return Some(self.fail());
            }
        };

        self.pages += 1;
        self.has_more = has_more;
        if has_more && cursor.is_none() {
            warn!(
                page = self.pages,
                "Server reported more pages without a cursor, stopping"
            );
            self.has_more = false;
        }
        self.page_token = cursor;

        debug!(page = self.pages, has_more = self.has_more, "Fetched page");
        Some(Some(page))
    }

    /// Number of pages successfully fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// True once no further requests will be made.
    pub fn is_finished(&self) -> bool {
        !self.has_more
    }

    /// Adapt into a [`Stream`] with the same item semantics.
    pub fn into_stream(self) -> impl Stream<Item = Option<T>> + Send
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |mut pages| async move {
            let item = pages.next_page().await?;
            Some((item, pages))
        })
    }

    fn fail(&mut self) -> Option<T> {
        self.has_more = false;
        None
    }
}

impl<T> std::fmt::Debug for PageIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageIterator")
            .field("params", &self.params)
            .field("has_more", &self.has_more)
            .field("page_token", &self.page_token)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

/// A usable cursor: a non-empty string.
fn cursor_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
