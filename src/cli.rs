//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use fetchline_core::{ExportFormat, PipelineConfig};

/// Fetch an index document and every item it lists, politely.
///
/// Fetchline requests the index, parses it into items, then fetches each
/// item's detail document with rate limiting and retries, and exports the
/// resulting records.
#[derive(Parser, Debug)]
#[command(name = "fetchline")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the index document
    pub index_url: String,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum items to fetch
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_items: Option<u32>,

    /// Maximum retries per fetch after the first attempt (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: Option<u32>,

    /// Requests per minute across all fetches (1-6000)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=6000))]
    pub rpm: Option<u32>,

    /// Per-request timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Directory for exported records
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Export format: json, csv or xlsx
    #[arg(short = 'f', long)]
    pub format: Option<ExportFormat>,

    /// Skip exporting records
    #[arg(long)]
    pub no_export: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Applies flag overrides on top of file configuration.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(max_items) = self.max_items {
            config.scraping.max_items = usize::try_from(max_items).unwrap_or(usize::MAX);
        }
        if let Some(max_retries) = self.max_retries {
            config.scraping.max_retries = max_retries;
        }
        if let Some(rpm) = self.rpm {
            // An explicit rate replaces the file's fixed delay floor.
            config.rate_limit.requests_per_minute = rpm;
            config.rate_limit.delay_between_requests = 0.0;
        }
        if let Some(timeout) = self.timeout {
            config.scraping.timeout_seconds = timeout;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory.clone_from(dir);
        }
        if let Some(format) = self.format {
            config.output.format = format.to_string();
        }
    }

    /// Returns the default log level implied by `-q` / `-v`, if any.
    #[must_use]
    pub fn level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            match self.verbose {
                0 => None,
                1 => Some("debug"),
                _ => Some("trace"),
            }
        }
    }
}
