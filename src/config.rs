//! Pipeline configuration loaded from a JSON file.
//!
//! Every section and every field has a default, so a partial file (or no file)
//! is valid input. Unknown keys are ignored. [`PipelineConfig::validate`]
//! reports every problem at once rather than stopping at the first.
//!
//! # Example
//!
//! ```
//! use fetchline_core::config::PipelineConfig;
//!
//! let config: PipelineConfig =
//!     serde_json::from_str(r#"{"scraping": {"max_items": 10}}"#).unwrap();
//! assert_eq!(config.scraping.max_items, 10);
//! assert_eq!(config.rate_limit.requests_per_minute, 30);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::export::ExportFormat;

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// One or more values are out of range.
    #[error("invalid configuration: {}", problems.join("; "))]
    Invalid {
        /// Every problem found, in field order.
        problems: Vec<String>,
    },
}

/// Request pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    /// Floor on the spacing between requests, in seconds.
    pub delay_between_requests: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 30,
            delay_between_requests: 2.0,
        }
    }
}

impl RateLimitConfig {
    /// Returns the spacing to enforce: the larger of `60 / rpm` and the fixed delay.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        let from_rpm = if self.requests_per_minute == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / self.requests_per_minute
        };
        let from_delay = Duration::try_from_secs_f64(self.delay_between_requests)
            .unwrap_or(Duration::ZERO);
        from_rpm.max(from_delay)
    }
}

/// Where and how exports are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// One of `json`, `csv`, `xlsx`.
    pub format: String,
    pub directory: PathBuf,
    /// File stem; `{timestamp}` is replaced at export time.
    pub filename_template: String,
    pub include_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            directory: PathBuf::from("./output"),
            filename_template: "scrape_{timestamp}".to_string(),
            include_metadata: true,
        }
    }
}

/// Run behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    #[serde(alias = "max_conversations")]
    pub max_items: usize,
    pub include_timestamps: bool,
    /// Keep only descriptors whose category is listed. Empty keeps all.
    #[serde(alias = "filter_bots")]
    pub filter_categories: Vec<String>,
    #[serde(alias = "skip_empty_conversations")]
    pub skip_empty_records: bool,
    pub max_retries: u32,
    /// Delay before the first retry, in seconds.
    pub retry_initial_delay: f64,
    pub retry_backoff_factor: f64,
    pub timeout_seconds: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            include_timestamps: true,
            filter_categories: Vec::new(),
            skip_empty_records: true,
            max_retries: 3,
            retry_initial_delay: 1.0,
            retry_backoff_factor: 2.0,
            timeout_seconds: 30,
        }
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `fetchline_core=debug`.
    pub level: String,
    /// Write logs to this file instead of stderr.
    pub file: Option<PathBuf>,
    /// Emit logs at all when no file is set.
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console: true,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rate_limit: RateLimitConfig,
    pub output: OutputConfig,
    pub scraping: ScrapingConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Writes configuration as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on any filesystem failure.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(io_error)
    }

    /// Checks every value a run depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing all problems found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.rate_limit.requests_per_minute == 0 {
            problems.push("rate_limit.requests_per_minute must be positive".to_string());
        }
        if !self.rate_limit.delay_between_requests.is_finite()
            || self.rate_limit.delay_between_requests < 0.0
        {
            problems.push("rate_limit.delay_between_requests cannot be negative".to_string());
        }

        if self.output.directory.as_os_str().is_empty() {
            problems.push("output.directory cannot be empty".to_string());
        }
        if self.output.format.parse::<ExportFormat>().is_err() {
            problems.push(format!(
                "output.format must be one of: json, csv, xlsx (got '{}')",
                self.output.format
            ));
        }

        if self.scraping.max_items == 0 {
            problems.push("scraping.max_items must be positive".to_string());
        }
        if self.scraping.timeout_seconds == 0 {
            problems.push("scraping.timeout_seconds must be positive".to_string());
        }
        if !self.scraping.retry_initial_delay.is_finite() || self.scraping.retry_initial_delay < 0.0
        {
            problems.push("scraping.retry_initial_delay cannot be negative".to_string());
        }
        if !self.scraping.retry_backoff_factor.is_finite()
            || self.scraping.retry_backoff_factor < 1.0
        {
            problems.push("scraping.retry_backoff_factor must be at least 1.0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scraping.timeout_seconds)
    }
}
