//! Progress aggregation with observer callbacks.
//!
//! [`ProgressTracker`] counts completed units against a fixed total and
//! notifies registered callbacks with a [`ProgressSnapshot`] on each update.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fetchline_core::progress::{ProgressSnapshot, ProgressTracker};
//!
//! let tracker = ProgressTracker::new(4, "Fetching records");
//! tracker.add_callback(Arc::new(|snapshot: &ProgressSnapshot| {
//!     println!("{}/{} ({:.0}%)", snapshot.current, snapshot.total, snapshot.percentage);
//!     Ok(())
//! }));
//!
//! tracker.update(1);
//! assert!((tracker.snapshot().percentage - 25.0).abs() < f64::EPSILON);
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::time::Instant;
use tracing::{trace, warn};

use crate::fetch::BoxError;

/// Observer invoked synchronously on every progress update.
///
/// Errors and panics are caught and logged; they never abort the update.
pub type ProgressCallback = Arc<dyn Fn(&ProgressSnapshot) -> Result<(), BoxError> + Send + Sync>;

/// Point-in-time view of a tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Completed units, never above `total`.
    pub current: usize,
    /// Units expected in total.
    pub total: usize,
    /// `current / total * 100`, or 0 when `total` is 0.
    pub percentage: f64,
    /// Seconds since construction or the last reset.
    pub elapsed_seconds: f64,
    /// Estimated seconds remaining, or 0 before the first completed unit.
    pub eta_seconds: f64,
    /// Human-readable label for the tracked work.
    pub description: String,
}

#[derive(Debug)]
struct TrackerState {
    current: usize,
    started_at: Instant,
}

/// Thread-safe completed-unit counter with percentage and ETA.
pub struct ProgressTracker {
    total: usize,
    description: String,
    state: Mutex<TrackerState>,
    callbacks: Mutex<Vec<ProgressCallback>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("description", &self.description)
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Creates a tracker for `total` units of work.
    #[must_use]
    pub fn new(total: usize, description: impl Into<String>) -> Self {
        Self {
            total,
            description: description.into(),
            state: Mutex::new(TrackerState {
                current: 0,
                started_at: Instant::now(),
            }),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Registers a callback for subsequent updates.
    pub fn add_callback(&self, callback: ProgressCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    /// Returns the total unit count.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns the completed unit count.
    #[must_use]
    pub fn current(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }

    /// Advances by `increment` units (clamped to `total`) and notifies callbacks.
    pub fn update(&self, increment: usize) {
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.current = state.current.saturating_add(increment).min(self.total);
            self.build_snapshot(&state)
        };
        trace!(
            current = snapshot.current,
            total = snapshot.total,
            "progress updated"
        );
        self.notify(&snapshot);
    }

    /// Zeroes the counter and restarts the elapsed clock.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current = 0;
        state.started_at = Instant::now();
    }

    /// Returns true once every unit has completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current() >= self.total
    }

    /// Returns the latest values without notifying callbacks.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.build_snapshot(&state)
    }

    #[allow(clippy::cast_precision_loss)]
    fn build_snapshot(&self, state: &TrackerState) -> ProgressSnapshot {
        let elapsed_seconds = state.started_at.elapsed().as_secs_f64();
        let percentage = if self.total == 0 {
            0.0
        } else {
            state.current as f64 / self.total as f64 * 100.0
        };
        let eta_seconds = if state.current == 0 {
            0.0
        } else {
            elapsed_seconds * (self.total - state.current) as f64 / state.current as f64
        };

        ProgressSnapshot {
            current: state.current,
            total: self.total,
            percentage,
            elapsed_seconds,
            eta_seconds,
            description: self.description.clone(),
        }
    }

    fn notify(&self, snapshot: &ProgressSnapshot) {
        // Callbacks run outside the lock so they may register further callbacks.
        let callbacks: Vec<ProgressCallback> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, callback) in callbacks.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    warn!(callback = index, error = %error, "progress callback failed");
                }
                Err(_) => {
                    warn!(callback = index, "progress callback panicked");
                }
            }
        }
    }
}
