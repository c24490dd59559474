//! Index-then-detail fetch orchestration.
//!
//! # Overview
//!
//! [`FetchPipeline::run`] fetches one index document, parses it into
//! descriptors, then fetches and parses each descriptor's detail document in
//! order. Every fetch goes through the shared [`crate::fetch::RateLimiter`]
//! and the [`crate::fetch::RetryExecutor`].
//!
//! - Per-item failures are collected, never fatal
//! - Only an unfetchable index fails the run
//! - Cancellation is checked before each item and during backoff waits
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fetchline_core::fetch::HttpTransport;
//! use fetchline_core::pipeline::{FetchPipeline, PipelineOptions};
//! use fetchline_core::records::JsonRecordParser;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Arc::new(FetchPipeline::new(
//!     PipelineOptions::new("https://example.com/index.json").with_max_items(20),
//!     Arc::new(HttpTransport::new()?),
//!     Arc::new(JsonRecordParser::new()),
//! )?);
//!
//! let cancel = pipeline.cancel_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     cancel.cancel();
//! });
//!
//! let outcome = pipeline.run(None).await?;
//! let stats = pipeline.stats();
//! println!("{:?}: {} records, {} entries", outcome.state, stats.total_records, stats.total_entries);
//! # Ok(())
//! # }
//! ```

mod error;
mod observer;
mod options;
mod runner;
mod state;

pub use error::PipelineError;
pub use observer::{RunObserver, TracingObserver};
pub use options::{DEFAULT_MAX_ITEMS, PipelineOptions};
pub use runner::{FetchPipeline, PROGRESS_DESCRIPTION};
pub use state::{FailureKind, ItemFailure, PipelineState, RunOutcome, RunState, RunStats};
