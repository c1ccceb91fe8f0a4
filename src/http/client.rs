//! HTTP fetch capability and its reqwest implementation
//!
//! The client sends exactly one request per call. It does not retry and it
//! does not interpret status codes; callers decide what a non-success status
//! means.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// URL the response was received from
    pub url: String,
    /// HTTP status
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl FetchResponse {
    /// Create a response
    pub fn new(url: impl Into<String>, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes a single HTTP request
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Send the request and read the full response
    async fn execute(&self, request: Request) -> Result<FetchResponse>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("gitlab-registry-lister/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// reqwest-backed HTTP client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid value for header '{key}': {e}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn execute(&self, request: Request) -> Result<FetchResponse> {
        let url = request.url().to_string();
        let method = request.method().clone();
        debug!("Sending {} {}", method, url);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::registry_transport(&url, transport_message(&e)))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::registry_transport(&url, transport_message(&e)))?;

        debug!("Received {} from {} {} ({} bytes)", status.as_u16(), method, url, body.len());
        Ok(FetchResponse::new(url, status, headers, body))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Describe a transport failure without repeating the URL
fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }
    if err.is_connect() {
        return "connection failed".to_string();
    }
    let message = err.to_string();
    match err.url() {
        Some(url) => message.replace(&format!(" ({url})"), ""),
        None => message,
    }
}
