//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::entities::{ApiResponse, HttpMethod, RequestDescriptor};
use crate::domain::errors::{ApiError, TransportError};
use crate::domain::ports::Transport;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("batchtrack/", env!("CARGO_PKG_VERSION"));

/// Sends requests to the tracking API over HTTP.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates transport with default timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates transport with custom timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &RequestDescriptor) -> Result<String, TransportError> {
        let path = request.path();
        if !request.is_relative() {
            return Err(TransportError::request(format!(
                "refusing to send outside the API base URL: {path}"
            )));
        }
        if path.starts_with('/') {
            Ok(format!("{}{path}", self.base_url))
        } else {
            Ok(format!("{}/{path}", self.base_url))
        }
    }
}

const fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_reqwest_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::connect(error.to_string())
    } else {
        TransportError::request(error.to_string())
    }
}

/// Turns a response body into JSON, keeping non-JSON text as a string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request)?;
        let mut builder = self.client.request(to_method(request.method()), &url);

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method(), %url, error = %e, "Request failed");
            map_reqwest_error(&e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| map_reqwest_error(&e))?;

        debug!(method = %request.method(), %url, status, "Response received");
        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}
