//! Sessions API.

use reqwest::Method;

use super::API_PREFIX;
use crate::client::AilyClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::transport::{ApiRequest, RequestOptions};
use crate::types::{CreateSessionRequest, SessionData};

/// Sessions API client.
pub struct SessionsApi {
    client: AilyClient,
}

impl SessionsApi {
    pub(crate) fn new(client: AilyClient) -> Self {
        Self { client }
    }

    /// Create a new session.
    pub async fn create(
        &self,
        request: CreateSessionRequest,
        options: &RequestOptions,
    ) -> Result<Envelope<SessionData>> {
        let request = ApiRequest::new(Method::POST, format!("{}/sessions", API_PREFIX))
            .with_data(serde_json::to_value(&request)?)
            .with_options(options);
        self.client.call(request).await
    }

    /// Get a session by ID.
    pub async fn get(&self, id: &str, options: &RequestOptions) -> Result<Envelope<SessionData>> {
        let request = ApiRequest::new(Method::GET, format!("{}/sessions/{}", API_PREFIX, id))
            .with_options(options);
        self.client.call(request).await
    }

    /// Delete a session.
    pub async fn delete(&self, id: &str, options: &RequestOptions) -> Result<Envelope> {
        let request = ApiRequest::new(Method::DELETE, format!("{}/sessions/{}", API_PREFIX, id))
            .with_options(options);
        self.client.send(request).await
    }
}
