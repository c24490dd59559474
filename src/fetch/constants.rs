//! Constants for the fetch module (timeouts, rate limiting, retry defaults).

use std::time::Duration;

/// Default per-request timeout (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Idle pooled connections kept per host.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default minimum spacing between granted requests (2 seconds).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(2);

/// Warning threshold for cumulative rate limit delay (30 seconds).
pub const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (1 second).
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default backoff multiplier (doubles each attempt).
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
