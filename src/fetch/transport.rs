//! Transport seam for fetching documents by URL.
//!
//! The pipeline only depends on the [`Transport`] trait. [`HttpTransport`] is
//! the production implementation backed by a pooled `reqwest::Client`; tests
//! substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST, REQUEST_TIMEOUT_SECS};
use super::error::TransportError;

/// Fetches a document body by URL.
///
/// This trait uses `async_trait` so pipelines can hold `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single GET and returns the body text.
    ///
    /// Implementations must not retry internally; retrying is the caller's job.
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// Default User-Agent identifying the tool.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("fetchline/{version} (+https://crates.io/crates/fetchline)")
}

/// HTTP transport with connection pooling and fixed default headers.
///
/// Create once and share; the inner client reuses connections.
///
/// # Example
///
/// ```no_run
/// use fetchline_core::fetch::{HttpTransport, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new()?;
/// let body = transport.get("https://example.com/index.json").await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend or system configuration
    /// cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a transport with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the client cannot be constructed.
    #[instrument(level = "debug", fields(timeout_ms = timeout.as_millis()))]
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .gzip(true)
            .user_agent(default_user_agent())
            .default_headers(default_headers())
            .build()?;
        Ok(Self { client })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json,text/html;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

fn map_request_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(url)
    } else {
        TransportError::connection(url, error)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(url, e))?;
        debug!(bytes = body.len(), "fetched document");
        Ok(body)
    }
}
