//! HTTP snapshot source.
//!
//! Issues a plain GET against the monitor-data endpoint on every fetch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{MonitorSnapshot, SnapshotSource};
use crate::error::FetchError;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/monitor_data";

/// A source that polls `/api/monitor_data` over HTTP.
///
/// No request timeout is applied unless one is set with
/// [`HttpSource::with_timeout`]; the client's defaults govern otherwise.
/// Failure bodies are never inspected.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    description: String,
    timeout: Option<Duration>,
}

impl HttpSource {
    /// Create a source for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a source that sends its requests through `client`.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        let url = url.into();
        let description = format!("http: {}", url);
        Self {
            client,
            url,
            description,
            timeout: None,
        }
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<MonitorSnapshot, FetchError> {
        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
