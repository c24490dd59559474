//! Run options for [`super::FetchPipeline`].

use std::time::Duration;

use super::error::PipelineError;
use crate::config::PipelineConfig;
use crate::fetch::{DEFAULT_MIN_INTERVAL, RetryPolicy};

/// Default upper bound on items per run.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Everything a pipeline needs to know besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// URL of the index document.
    pub index_url: String,
    /// Configured upper bound; `run(Some(n))` can only lower it.
    pub max_items: usize,
    pub retry_policy: RetryPolicy,
    /// Spacing between any two requests. Zero disables rate limiting.
    pub min_interval: Duration,
    /// Keep entry timestamps in records.
    pub include_timestamps: bool,
    /// Drop records that parsed to zero entries.
    pub skip_empty_records: bool,
    /// Keep only descriptors in these categories. Empty keeps all.
    pub filter_categories: Vec<String>,
}

impl PipelineOptions {
    /// Creates options with defaults for everything but the index URL.
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            max_items: DEFAULT_MAX_ITEMS,
            retry_policy: RetryPolicy::default(),
            min_interval: DEFAULT_MIN_INTERVAL,
            include_timestamps: true,
            skip_empty_records: true,
            filter_categories: Vec::new(),
        }
    }

    /// Builds options from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
    pub fn from_config(
        index_url: impl Into<String>,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let scraping = &config.scraping;
        let initial_delay =
            Duration::try_from_secs_f64(scraping.retry_initial_delay).unwrap_or(Duration::ZERO);

        let options = Self {
            index_url: index_url.into(),
            max_items: scraping.max_items,
            retry_policy: RetryPolicy::new(
                scraping.max_retries,
                initial_delay,
                scraping.retry_backoff_factor,
            ),
            min_interval: config.rate_limit.min_interval(),
            include_timestamps: scraping.include_timestamps,
            skip_empty_records: scraping.skip_empty_records,
            filter_categories: scraping.filter_categories.clone(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Sets the configured item bound.
    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the request spacing.
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Sets the category filter.
    #[must_use]
    pub fn with_filter_categories(mut self, categories: Vec<String>) -> Self {
        self.filter_categories = categories;
        self
    }

    /// Returns the effective bound for a run given the caller's request.
    #[must_use]
    pub fn requested(&self, max_items: Option<usize>) -> usize {
        max_items.map_or(self.max_items, |n| n.min(self.max_items))
    }

    /// Returns true if `category` passes the filter.
    #[must_use]
    pub fn accepts_category(&self, category: &str) -> bool {
        self.filter_categories.is_empty() || self.filter_categories.iter().any(|c| c == category)
    }

    /// Checks options that do not come pre-validated from a config file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an empty URL or a zero bound.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.index_url.trim().is_empty() {
            return Err(PipelineError::invalid_config("index URL cannot be empty"));
        }
        if self.max_items == 0 {
            return Err(PipelineError::invalid_config("max_items must be positive"));
        }
        Ok(())
    }
}
