//! Fetchline Core Library
//!
//! This library provides a rate-limited, retrying "index then detail" fetch
//! pipeline: fetch one index document, parse it into item descriptors, then
//! fetch and parse each item into a structured record while reporting
//! progress and tolerating transient network failures.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Rate limiter, retry executor, cancellation and HTTP transport
//! - [`records`] - Data model and the parser seam
//! - [`progress`] - Progress aggregation with observer callbacks
//! - [`pipeline`] - Run orchestration, state machine and statistics
//! - [`config`] - JSON configuration with defaults and validation
//! - [`export`] - Writing record sets to files
//! - [`util`] - Filename and duration formatting

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod records;
pub mod util;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig};
pub use export::{ExportError, ExportFormat, Exporter, FileExporter};
pub use fetch::{
    CancelHandle, HttpTransport, RateLimiter, RetryError, RetryExecutor, RetryPolicy, Transport,
    TransportError,
};
pub use pipeline::{
    FetchPipeline, PipelineError, PipelineOptions, PipelineState, RunObserver, RunOutcome,
    RunStats,
};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use records::{ItemDescriptor, JsonRecordParser, ParseError, Record, RecordParser};
