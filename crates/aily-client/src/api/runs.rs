//! Runs API.

use reqwest::Method;
use serde_json::{Map, Value};

use super::{API_PREFIX, page_iterator, put};
use crate::client::AilyClient;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::pagination::PageIterator;
use crate::transport::{ApiRequest, RequestOptions};
use crate::types::{CreateRunRequest, ListRunsResponse, RunData, RunPage};

/// Query parameters for listing runs.
#[derive(Debug, Clone, Default)]
pub struct ListRunsQuery {
    /// Page size.
    pub page_size: Option<u32>,
    /// Cursor to start from.
    pub page_token: Option<String>,
}

impl ListRunsQuery {
    /// Query parameters as a map.
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        put(&mut params, "page_size", self.page_size);
        put(&mut params, "page_token", self.page_token.clone());
        params
    }
}

/// Runs API client.
pub struct RunsApi {
    client: AilyClient,
}

impl RunsApi {
    pub(crate) fn new(client: AilyClient) -> Self {
        Self { client }
    }

    /// Start a run in a session.
    pub async fn create(
        &self,
        session_id: &str,
        request: CreateRunRequest,
        options: &RequestOptions,
    ) -> Result<Envelope<RunData>> {
        let request = ApiRequest::new(Method::POST, runs_path(session_id))
            .with_data(serde_json::to_value(&request)?)
            .with_options(options);
        self.client.call(request).await
    }

    /// Get a run by ID.
    pub async fn get(
        &self,
        session_id: &str,
        run_id: &str,
        options: &RequestOptions,
    ) -> Result<Envelope<RunData>> {
        let request = ApiRequest::new(Method::GET, run_path(session_id, run_id))
            .with_options(options);
        self.client.call(request).await
    }

    /// Cancel a run.
    pub async fn cancel(
        &self,
        session_id: &str,
        run_id: &str,
        options: &RequestOptions,
    ) -> Result<Envelope<RunData>> {
        let path = format!("{}/cancel", run_path(session_id, run_id));
        let request = ApiRequest::new(Method::POST, path).with_options(options);
        self.client.call(request).await
    }

    /// List one page of runs.
    pub async fn list(
        &self,
        session_id: &str,
        query: &ListRunsQuery,
        options: &RequestOptions,
    ) -> Result<Envelope<ListRunsResponse>> {
        let request = ApiRequest::new(Method::GET, runs_path(session_id))
            .with_params(query.params())
            .with_options(options);
        self.client.call(request).await
    }

    /// Iterate over every page of runs.
    pub fn list_with_iterator(
        &self,
        session_id: &str,
        query: &ListRunsQuery,
        options: &RequestOptions,
    ) -> PageIterator<RunPage> {
        page_iterator(&self.client, runs_path(session_id), query.params(), options)
    }
}

fn runs_path(session_id: &str) -> String {
    format!("{}/sessions/{}/runs", API_PREFIX, session_id)
}

fn run_path(session_id: &str, run_id: &str) -> String {
    format!("{}/{}", runs_path(session_id), run_id)
}
