//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aily_session::{MemoryRecordCache, SessionRecords, SharedRecordCache};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error};
use url::Url;

use crate::api::{MessagesApi, RunsApi, SessionsApi};
use crate::completions::{CompletionSettings, Completions};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::transport::{ApiRequest, SharedTransport, Transport};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Aily API client.
///
/// Provides typed access to the session, message and run endpoints and the
/// completion pipeline built on top of them.
///
/// # Example
///
/// ```no_run
/// use aily_client::AilyClient;
///
/// # async fn example() -> aily_client::Result<()> {
/// let client = AilyClient::builder()
///     .base_url("https://open.feishu.cn")
///     .auth_token("t-secret")
///     .build()?;
///
/// let session = client.sessions().create(Default::default(), &Default::default()).await?;
/// println!("code: {}", session.code);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AilyClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// Transport every call goes through.
    pub(crate) transport: SharedTransport,
    /// Session key → session id mapping used by completions.
    pub(crate) records: SessionRecords,
    /// Completion pipeline settings.
    pub(crate) completion_settings: CompletionSettings,
}

impl AilyClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the sessions API.
    pub fn sessions(&self) -> SessionsApi {
        SessionsApi::new(self.clone())
    }

    /// Access the messages API.
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.clone())
    }

    /// Access the runs API.
    pub fn runs(&self) -> RunsApi {
        RunsApi::new(self.clone())
    }

    /// Access the completion pipeline.
    pub fn completions(&self) -> Completions {
        Completions::new(
            self.clone(),
            self.inner.records.clone(),
            self.inner.completion_settings.clone(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal call helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request, logging rejections.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<Envelope> {
        let method = request.method.clone();
        let path = request.path.clone();
        debug!(method = %method, path = %path, "Sending request");

        match self.inner.transport.send(request).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                error!(method = %method, path = %path, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    /// Send a request and decode its payload.
    pub(crate) async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>> {
        let path = request.path.clone();
        self.send(request).await?.decode().inspect_err(|e| {
            error!(path = %path, error = %e, "Failed to decode response payload");
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP transport
// ─────────────────────────────────────────────────────────────────────────────

/// [`Transport`] over HTTP/JSON using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `base_url` using a prepared reqwest client.
    pub fn new(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.base_url.join(path).map_err(Error::from)
    }

    /// Extract an error from a failed response.
    async fn extract_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();

        match response.json::<Envelope>().await {
            Ok(envelope) => Error::Api {
                status,
                code: envelope.code,
                message: envelope.msg,
            },
            Err(_) => Error::Api {
                status,
                code: -1,
                message: format!("HTTP {}", status),
            },
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Envelope> {
        let url = self.url(&request.path)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Config(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Config(format!("Invalid header value for {}", name)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .http
            .request(request.method, url)
            .headers(headers)
            .timeout(self.timeout);
        if !request.params.is_empty() {
            builder = builder.query(&query_pairs(&request.params));
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::extract_error(response).await)
        }
    }
}

/// Flatten query parameters: scalars stringified, arrays repeated, nulls dropped.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an AilyClient.
pub struct ClientBuilder {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<SharedTransport>,
    record_cache: Option<SharedRecordCache>,
    completion_settings: CompletionSettings,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
            record_cache: None,
            completion_settings: CompletionSettings::default(),
        }
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the bearer token sent with every request.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a custom transport instead of HTTP. `base_url` is then optional.
    pub fn transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a specific record cache for session records.
    ///
    /// Defaults to a fresh [`MemoryRecordCache`].
    pub fn record_cache(mut self, cache: SharedRecordCache) -> Self {
        self.record_cache = Some(cache);
        self
    }

    /// Set the completion pipeline settings.
    pub fn completion_settings(mut self, settings: CompletionSettings) -> Self {
        self.completion_settings = settings;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AilyClient> {
        let transport: SharedTransport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(Self::http_transport(
                self.base_url,
                self.auth_token,
                self.user_agent,
                self.timeout,
            )?),
        };

        let cache = self
            .record_cache
            .unwrap_or_else(|| Arc::new(MemoryRecordCache::new()) as SharedRecordCache);

        Ok(AilyClient {
            inner: Arc::new(ClientInner {
                transport,
                records: SessionRecords::new(cache),
                completion_settings: self.completion_settings,
            }),
        })
    }

    fn http_transport(
        base_url: Option<String>,
        auth_token: Option<String>,
        user_agent: Option<String>,
        timeout: Duration,
    ) -> Result<HttpTransport> {
        let base_url =
            base_url.ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        if let Some(token) = &auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("Invalid auth token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let user_agent =
            user_agent.unwrap_or_else(|| format!("aily-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(HttpTransport::new(http, base_url, timeout))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("custom_transport", &self.transport.is_some())
            .field("completion_settings", &self.completion_settings)
            .finish()
    }
}
