//! CLI entry point for the fetchline tool.

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fetchline_core::config::LoggingConfig;
use fetchline_core::util::format_duration;
use fetchline_core::{
    ExportFormat, Exporter, FetchPipeline, FileExporter, HttpTransport, JsonRecordParser,
    PipelineConfig, PipelineOptions, ProgressSnapshot,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use url::Url;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    args.apply_to(&mut config);

    init_tracing(&args, &config.logging)?;
    debug!(?args, "CLI arguments parsed");

    config.validate().context("invalid configuration")?;
    let format: ExportFormat = config.output.format.parse()?;
    let exporter = FileExporter::from_config(&config.output);
    if !args.no_export && !exporter.supports(format) {
        anyhow::bail!("export format '{format}' is not supported (use json or --no-export)");
    }

    let index_url = Url::parse(&args.index_url)
        .with_context(|| format!("index URL is not an absolute URL: {}", args.index_url))?;
    let transport = HttpTransport::with_timeout(config.request_timeout())
        .context("failed to build HTTP client")?;
    let parser = JsonRecordParser::with_base_url(index_url.clone());
    let options = PipelineOptions::from_config(index_url.as_str(), &config)?;

    let pipeline = Arc::new(FetchPipeline::new(
        options,
        Arc::new(transport),
        Arc::new(parser),
    )?);

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            cancel.cancel();
        }
    });

    let bar = progress_bar(!args.quiet && io::stderr().is_terminal());
    {
        let bar = bar.clone();
        pipeline.on_progress(Arc::new(move |snapshot: &ProgressSnapshot| {
            render_progress(&bar, snapshot);
            Ok(())
        }));
    }

    let options = pipeline.options();
    info!(
        url = %index_url,
        max_items = options.max_items,
        max_retries = options.retry_policy.max_retries(),
        min_interval_ms = options.min_interval.as_millis(),
        "Fetchline starting"
    );
    let outcome = pipeline.run(None).await;
    bar.finish_and_clear();
    let outcome = outcome?;

    let stats = pipeline.stats();
    info!(
        state = %outcome.state,
        records = stats.total_records,
        entries = stats.total_entries,
        failed = outcome.failures.len(),
        skipped = outcome.skipped.len(),
        "Run finished"
    );
    for (category, count) in &stats.category_distribution {
        info!(category = %category, records = count, "Category");
    }
    if outcome.was_cancelled() {
        warn!(
            records = outcome.records.len(),
            "Run cancelled, partial results kept"
        );
    }

    if args.no_export || outcome.records.is_empty() {
        debug!("nothing to export");
        return Ok(());
    }

    let path = exporter
        .export(&outcome.records, format, None)
        .context("failed to export records")?;
    info!(path = %path.display(), "Records exported");

    Ok(())
}

/// Installs the global subscriber.
///
/// Priority: `RUST_LOG` > `-q` > `-v` > configured level.
fn init_tracing(args: &Args, logging: &LoggingConfig) -> Result<()> {
    let default_level = match args.level_override() {
        Some(level) => level,
        None if logging.file.is_none() && !logging.console => "off",
        None => logging.level.as_str(),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn render_progress(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_length(snapshot.total as u64);
    bar.set_position(snapshot.current as u64);
    let eta = Duration::try_from_secs_f64(snapshot.eta_seconds).unwrap_or_default();
    bar.set_message(format!(
        "{:.0}% | ETA {}",
        snapshot.percentage,
        format_duration(eta)
    ));
}
