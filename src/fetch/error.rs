//! Error types for the fetch module.
//!
//! [`TransportError`] covers a single network call and is always retryable.
//! [`RetryError`] is what the retry executor hands back once it stops trying.

use thiserror::Error;

/// Boxed error used for transport failures that carry an opaque cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a single document fetch.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request did not complete within the transport timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Connection-level failure (DNS, refused connection, TLS, broken body stream).
    #[error("connection error fetching {url}: {source}")]
    Connection {
        /// The URL that failed.
        url: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl TransportError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a connection error from any underlying cause.
    pub fn connection(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Returns the URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Connection { url, .. } | Self::HttpStatus { url, .. } => {
                url
            }
        }
    }
}

/// Terminal outcome of a retried operation that never succeeded.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every allowed attempt failed; carries the last underlying error.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        /// Total attempts made (initial attempt included).
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: E,
    },

    /// Cancellation was observed while waiting to retry.
    #[error("cancelled after {attempts} attempts (last error: {last_error})")]
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
        /// The error that triggered the interrupted wait.
        last_error: E,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the number of attempts made before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Returns true when the retry loop stopped because of cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the last underlying error.
    #[must_use]
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } => source,
            Self::Cancelled { last_error, .. } => last_error,
        }
    }
}
