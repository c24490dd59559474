//! Fetch layer: rate limiting, retry, cancellation and the transport seam.
//!
//! # Overview
//!
//! - [`RateLimiter`] - One shared clock spacing every request
//! - [`RetryExecutor`] / [`RetryPolicy`] - Deterministic exponential backoff
//! - [`CancelHandle`] - Cooperative cancellation observed by backoff waits
//! - [`Transport`] / [`HttpTransport`] - Single-attempt document GET
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use fetchline_core::fetch::{
//!     CancelHandle, HttpTransport, RateLimiter, RetryExecutor, RetryPolicy, Transport,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new()?;
//! let limiter = RateLimiter::from_requests_per_minute(30);
//! let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::from_secs(1), 2.0));
//! let cancel = CancelHandle::new();
//!
//! limiter.acquire().await;
//! let body = executor
//!     .execute(&cancel, |_| transport.get("https://example.com/index.json"))
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

mod cancel;
mod constants;
mod error;
mod rate_limiter;
mod retry;
mod transport;

pub use cancel::CancelHandle;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES,
    DEFAULT_MIN_INTERVAL, REQUEST_TIMEOUT_SECS,
};
pub use error::{BoxError, RetryError, TransportError};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryExecutor, RetryPolicy};
pub use transport::{HttpTransport, Transport, default_user_agent};
