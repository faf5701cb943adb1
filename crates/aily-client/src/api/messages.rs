//! Messages API.

use reqwest::Method;
use serde_json::{Map, Value};

use super::{API_PREFIX, page_iterator, put};
use crate::client::AilyClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::pagination::PageIterator;
use crate::transport::{ApiRequest, RequestOptions};
use crate::types::{CreateMessageRequest, ListMessagesResponse, MessageData, MessagePage};

/// Query parameters for listing messages.
#[derive(Debug, Clone, Default)]
pub struct ListMessagesQuery {
    /// Page size.
    pub page_size: Option<u32>,
    /// Cursor to start from.
    pub page_token: Option<String>,
    /// Only messages produced by this run.
    pub run_id: Option<String>,
    /// Include messages still being generated.
    pub with_partial_message: Option<bool>,
}

impl ListMessagesQuery {
    /// Query parameters as a map.
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        put(&mut params, "page_size", self.page_size);
        put(&mut params, "page_token", self.page_token.clone());
        put(&mut params, "run_id", self.run_id.clone());
        put(&mut params, "with_partial_message", self.with_partial_message);
        params
    }
}

/// Messages API client.
pub struct MessagesApi {
    client: AilyClient,
}

impl MessagesApi {
    pub(crate) fn new(client: AilyClient) -> Self {
        Self { client }
    }

    /// Send a message to a session.
    pub async fn create(
        &self,
        session_id: &str,
        request: CreateMessageRequest,
        options: &RequestOptions,
    ) -> Result<Envelope<MessageData>> {
        let request = ApiRequest::new(Method::POST, messages_path(session_id))
            .with_data(serde_json::to_value(&request)?)
            .with_options(options);
        self.client.call(request).await
    }

    /// Get a message by ID.
    pub async fn get(
        &self,
        session_id: &str,
        message_id: &str,
        options: &RequestOptions,
    ) -> Result<Envelope<MessageData>> {
        let path = format!("{}/{}", messages_path(session_id), message_id);
        let request = ApiRequest::new(Method::GET, path).with_options(options);
        self.client.call(request).await
    }

    /// List one page of messages.
    pub async fn list(
        &self,
        session_id: &str,
        query: &ListMessagesQuery,
        options: &RequestOptions,
    ) -> Result<Envelope<ListMessagesResponse>> {
        let request = ApiRequest::new(Method::GET, messages_path(session_id))
            .with_params(query.params())
            .with_options(options);
        self.client.call(request).await
    }

    /// Iterate over every page of messages.
    pub fn list_with_iterator(
        &self,
        session_id: &str,
        query: &ListMessagesQuery,
        options: &RequestOptions,
    ) -> PageIterator<MessagePage> {
        page_iterator(
            &self.client,
            messages_path(session_id),
            query.params(),
            options,
        )
    }
}

fn messages_path(session_id: &str) -> String {
    format!("{}/sessions/{}/messages", API_PREFIX, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_skip_unset() {
        let query = ListMessagesQuery {
            page_size: Some(50),
            run_id: Some("run_9".into()),
            ..Default::default()
        };
        assert_eq!(
            Value::Object(query.params()),
            json!({"page_size": 50, "run_id": "run_9"})
        );
    }

    #[test]
    fn test_messages_path() {
        assert_eq!(
            messages_path("sess_1"),
            "open-apis/aily/v1/sessions/sess_1/messages"
        );
    }
}
