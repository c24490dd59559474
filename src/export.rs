//! Exporting records to files.
//!
//! [`ExportFormat`] is the closed set of formats a configuration may name.
//! [`FileExporter`] is the reference [`Exporter`]: it writes JSON and rejects
//! the tabular formats with [`ExportError::UnsupportedFormat`].
//!
//! # Example
//!
//! ```no_run
//! use fetchline_core::export::{ExportFormat, Exporter, FileExporter};
//!
//! # fn example(records: &[fetchline_core::records::Record]) -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = FileExporter::new("./output");
//! let path = exporter.export(records, ExportFormat::Json, None)?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::OutputConfig;
use crate::records::Record;
use crate::util::sanitize_filename;

/// Default file stem template.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "scrape_{timestamp}";

/// Export formats a configuration may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Returns the file extension (without dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error for format names outside the supported set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown export format '{0}' (expected json, csv or xlsx)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The format is valid but this exporter cannot write it.
    #[error("export format '{format}' is not supported by this exporter")]
    UnsupportedFormat { format: ExportFormat },

    /// Creating the directory or writing the file failed.
    #[error("failed to write export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding records failed.
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes a record set somewhere and returns where.
pub trait Exporter {
    /// Returns true if [`Exporter::export`] can write `format`.
    ///
    /// Callers check this before starting a run so an unwritable format
    /// fails before any fetching.
    fn supports(&self, format: ExportFormat) -> bool;

    /// Exports `records` in `format`.
    ///
    /// `filename` overrides the configured file stem; the extension is added
    /// from the format.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the format is unsupported or writing fails.
    fn export(
        &self,
        records: &[Record],
        format: ExportFormat,
        filename: Option<&str>,
    ) -> Result<PathBuf, ExportError>;
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    exported_at: DateTime<Utc>,
    record_count: usize,
    records: &'a [Record],
}

/// File-based exporter writing JSON documents into a directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    filename_template: String,
    include_metadata: bool,
}

impl FileExporter {
    /// Creates an exporter with the default template and metadata included.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            include_metadata: true,
        }
    }

    /// Creates an exporter from the `output` configuration section.
    #[must_use]
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            output_dir: config.directory.clone(),
            filename_template: config.filename_template.clone(),
            include_metadata: config.include_metadata,
        }
    }

    /// Overrides the file stem template.
    #[must_use]
    pub fn with_filename_template(mut self, template: impl Into<String>) -> Self {
        self.filename_template = template.into();
        self
    }

    /// Toggles per-record metadata in the output.
    #[must_use]
    pub fn with_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Expands `{timestamp}` in the template and sanitizes the result.
    #[must_use]
    pub fn render_filename(&self, now: DateTime<Utc>, format: ExportFormat) -> String {
        let stem = self
            .filename_template
            .replace("{timestamp}", &now.format("%Y%m%d_%H%M%S").to_string());
        format!("{}.{}", sanitize_filename(&stem), format.extension())
    }

    fn write_json(&self, path: &Path, records: &[Record]) -> Result<(), ExportError> {
        let stripped: Vec<Record>;
        let source: &[Record] = if self.include_metadata {
            records
        } else {
            stripped = records
                .iter()
                .cloned()
                .map(|mut record| {
                    record.metadata.clear();
                    record
                })
                .collect();
            &stripped
        };

        let document = ExportDocument {
            exported_at: Utc::now(),
            record_count: source.len(),
            records: source,
        };

        let io_error = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush().map_err(io_error)
    }
}

impl Exporter for FileExporter {
    fn supports(&self, format: ExportFormat) -> bool {
        format == ExportFormat::Json
    }

    #[instrument(skip(self, records), fields(record_count = records.len()))]
    fn export(
        &self,
        records: &[Record],
        format: ExportFormat,
        filename: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        if !self.supports(format) {
            return Err(ExportError::UnsupportedFormat { format });
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let filename = match filename {
            Some(name) => format!("{}.{}", sanitize_filename(name), format.extension()),
            None => self.render_filename(Utc::now(), format),
        };
        let path = self.output_dir.join(filename);

        self.write_json(&path, records)?;
        info!(path = %path.display(), "exported records");
        Ok(path)
    }
}
