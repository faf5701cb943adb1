//! API endpoint implementations.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::AilyClient;
use crate::pagination::{PageIterator, PageRequest};
use crate::transport::{ApiRequest, RequestOptions};

mod messages;
mod runs;
mod sessions;

pub use messages::{ListMessagesQuery, MessagesApi};
pub use runs::{ListRunsQuery, RunsApi};
pub use sessions::SessionsApi;

/// Path prefix shared by every endpoint.
pub(crate) const API_PREFIX: &str = "open-apis/aily/v1";

/// Build a [`PageIterator`] over a GET list endpoint.
pub(crate) fn page_iterator<T: DeserializeOwned>(
    client: &AilyClient,
    path: String,
    params: Map<String, Value>,
    options: &RequestOptions,
) -> PageIterator<T> {
    let client = client.clone();
    let fetch = move |page: PageRequest| {
        let client = client.clone();
        let mut request = ApiRequest::new(Method::GET, path.clone()).with_params(page.params);
        request.data = page.data;
        request.headers = page.headers;
        async move { client.send(request).await }
    };

    PageIterator::new(
        fetch,
        PageRequest {
            params,
            data: None,
            headers: options.headers.clone(),
        },
    )
}

/// Insert `value` under `key` when present.
pub(crate) fn put<V: Into<Value>>(params: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value.into());
    }
}
