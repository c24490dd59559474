//! Error types surfaced by [`super::FetchPipeline::run`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::fetch::{RetryError, TransportError};

/// Errors that abort a whole run.
///
/// Per-item failures never appear here; they are collected in the outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The index document could not be fetched after every retry.
    #[error("failed to fetch index {url}: {source}")]
    IndexFetch {
        url: String,
        #[source]
        source: RetryError<TransportError>,
    },

    /// Options or configuration were rejected before the run started.
    #[error("invalid pipeline configuration: {reason}")]
    InvalidConfig { reason: String },

    /// `run()` was called while another run was in progress.
    #[error("pipeline is already running")]
    AlreadyRunning,
}

impl PipelineError {
    /// Creates an invalid-configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(error: ConfigError) -> Self {
        Self::invalid_config(error.to_string())
    }
}
