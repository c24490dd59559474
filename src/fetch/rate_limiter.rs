//! Shared-clock rate limiting for document fetches.
//!
//! This module provides the [`RateLimiter`] struct which enforces a minimum
//! spacing between granted requests across *every* caller sharing the
//! instance, so a single target is never hit faster than the configured rate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fetchline_core::fetch::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_secs(2)));
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits until 2 seconds after the first grant
//! limiter.acquire().await;
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::CUMULATIVE_DELAY_WARNING_THRESHOLD;

/// Minimum-interval rate limiter with a single shared clock.
///
/// The last-granted timestamp sits behind a `tokio::sync::Mutex` that is held
/// across the delay, so concurrent callers are granted one at a time and each
/// grant is spaced from the one immediately before it.
///
/// # Thread Safety
///
/// `RateLimiter` is `Send + Sync`; share it with `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two grants.
    min_interval: Duration,

    /// Time of the previous grant. `None` until the first grant.
    last_granted: Mutex<Option<Instant>>,

    /// Total delay applied so far (in milliseconds).
    cumulative_delay_ms: AtomicU64,
}

impl RateLimiter {
    /// Creates a rate limiter that spaces grants by `min_interval`.
    ///
    /// A zero interval disables waiting entirely.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = min_interval.as_millis()))]
    pub fn new(min_interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            min_interval,
            last_granted: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    /// Creates a rate limiter allowing at most `requests_per_minute` grants per minute.
    ///
    /// Zero requests per minute yields a disabled limiter.
    #[must_use]
    pub fn from_requests_per_minute(requests_per_minute: u32) -> Self {
        if requests_per_minute == 0 {
            return Self::disabled();
        }
        Self::new(Duration::from_secs(60) / requests_per_minute)
    }

    /// Creates a disabled rate limiter that never delays.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns whether rate limiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.min_interval.is_zero()
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns the total delay this limiter has imposed so far.
    #[must_use]
    pub fn cumulative_delay(&self) -> Duration {
        Duration::from_millis(self.cumulative_delay_ms.load(Ordering::SeqCst))
    }

    /// Waits until a request may be issued, then records the grant.
    ///
    /// The first call returns immediately. Later calls return no earlier than
    /// `min_interval` after the previous grant, whichever caller received it.
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        if self.is_disabled() {
            return;
        }

        // Held across the sleep: this is what serializes concurrent callers.
        let mut last_granted = self.last_granted.lock().await;

        if let Some(last) = *last_granted {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval.saturating_sub(elapsed);
                let cumulative = self.add_cumulative_delay(delay);

                debug!(
                    delay_ms = delay.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying rate limit delay"
                );

                if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD
                    && cumulative.saturating_sub(delay) < CUMULATIVE_DELAY_WARNING_THRESHOLD
                {
                    warn!(
                        cumulative_delay_secs = cumulative.as_secs(),
                        "rate limiting has added over 30s of waiting to this run"
                    );
                }

                tokio::time::sleep(delay).await;
            }
        } else {
            debug!("first request - no delay");
        }

        *last_granted = Some(Instant::now());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(super::constants::DEFAULT_MIN_INTERVAL)
    }
}
