//! Retry logic with deterministic exponential backoff.
//!
//! This module provides [`RetryPolicy`] (how often and how long to wait) and
//! [`RetryExecutor`] (the loop that runs an async operation under a policy).
//!
//! # Delay Calculation
//!
//! ```text
//! delay(attempt) = initial_delay * backoff_factor^attempt     (attempt is 0-based)
//! ```
//!
//! There is no jitter.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fetchline_core::fetch::{CancelHandle, RetryExecutor, RetryPolicy};
//!
//! # async fn example() {
//! let executor = RetryExecutor::new(RetryPolicy::new(2, Duration::from_millis(100), 2.0));
//! let cancel = CancelHandle::new();
//!
//! let result: Result<u32, _> = executor
//!     .execute(&cancel, |_attempt| async { Ok::<_, std::io::Error>(7) })
//!     .await;
//! assert_eq!(result.unwrap(), 7);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::cancel::CancelHandle;
use super::constants::{DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
use super::error::RetryError;

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 3 (so 4 attempts in total)
/// - `initial_delay`: 1 second
/// - `backoff_factor`: 2.0
///
/// With defaults the waits are 1s, 2s, 4s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    max_retries: u32,

    /// Wait before the first retry.
    initial_delay: Duration,

    /// Multiplier applied for each further retry.
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// Negative or non-finite factors are treated as 1.0 (constant backoff).
    #[must_use]
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        let backoff_factor = if backoff_factor.is_finite() && backoff_factor >= 0.0 {
            backoff_factor
        } else {
            1.0
        };
        Self {
            max_retries,
            initial_delay,
            backoff_factor,
        }
    }

    /// Creates a policy with a custom retry count, using defaults for the rest.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the total number of attempts this policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns the delay before the first retry.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Returns the backoff multiplier.
    #[must_use]
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Returns the wait that follows failed attempt number `attempt` (0-based).
    ///
    /// Rounded to whole milliseconds.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay_ms = (base_ms * self.backoff_factor.powi(exponent)).round();
        if delay_ms.is_finite() && delay_ms < u64::MAX as f64 {
            Duration::from_millis(delay_ms as u64)
        } else {
            Duration::MAX
        }
    }

    /// Returns the summed wait if every attempt fails.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Runs fallible async operations under a [`RetryPolicy`].
///
/// Cheap to clone; holds only the policy.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Creates an executor for the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy this executor applies.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds or the policy is exhausted.
    ///
    /// `operation` receives the 0-based attempt index. Every failure is
    /// retried. Backoff waits race against `cancel`; a cancellation during a
    /// wait returns [`RetryError::Cancelled`] at once.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Exhausted`] with the last error after
    /// `max_retries + 1` failed attempts, or [`RetryError::Cancelled`] when
    /// cancellation interrupts a backoff wait.
    #[instrument(skip_all, fields(max_attempts = self.policy.max_attempts()))]
    pub async fn execute<T, E, F, Fut>(
        &self,
        cancel: &CancelHandle,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;

        loop {
            debug!(attempt, "attempting operation");

            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= self.policy.max_retries {
                debug!(attempts = attempt + 1, "max attempts reached");
                return Err(RetryError::Exhausted {
                    attempts: attempt + 1,
                    source: error,
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts = self.policy.max_attempts(),
                delay_ms = delay.as_millis(),
                error = %error,
                "attempt failed, retrying"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempt = attempt + 1, "retry wait cancelled");
                    return Err(RetryError::Cancelled {
                        attempts: attempt + 1,
                        last_error: error,
                    });
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
