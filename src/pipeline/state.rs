//! Run state, outcomes and statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::Record;

/// Lifecycle of a [`super::FetchPipeline`].
///
/// `Idle → Running → {Completed, Cancelled, Failed}`; a terminal pipeline may
/// run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl PipelineState {
    /// Returns true for `Completed`, `Cancelled` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Stage at which an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Every fetch attempt failed.
    Fetch,
    /// The body was fetched but could not be parsed.
    Parse,
}

/// One item that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub descriptor_id: String,
    pub url: String,
    pub kind: FailureKind,
    /// Display form of the final error.
    pub reason: String,
    /// Fetch attempts made for this item.
    pub attempts: u32,
}

/// Mutable record of the current or last run.
///
/// Only the driving task writes it; everyone else reads a clone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunState {
    /// Upper bound on items for this run.
    pub requested: usize,
    /// Records in the order their descriptors were listed.
    pub completed: Vec<Record>,
    pub failed: Vec<ItemFailure>,
    /// Ids of items dropped for having no entries.
    pub skipped: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub(crate) fn started(requested: usize) -> Self {
        Self {
            requested,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Returns how many items reached a final disposition.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.completed.len() + self.failed.len() + self.skipped.len()
    }
}

/// What `run()` hands back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// `Completed` or `Cancelled`; failed runs return an error instead.
    pub state: PipelineState,
    pub records: Vec<Record>,
    pub failures: Vec<ItemFailure>,
    pub skipped: Vec<String>,
}

impl RunOutcome {
    /// Returns true when the run stopped because of cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.state == PipelineState::Cancelled
    }
}

/// Aggregate statistics over the records of the last run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub total_records: usize,
    pub total_entries: usize,
    /// 0 when there are no records.
    pub average_entries_per_record: f64,
    /// Record count per category, in first-occurrence order.
    pub category_distribution: Vec<(String, usize)>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    /// Computes statistics from a run state. Pure.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_run_state(state: &RunState) -> Self {
        let total_records = state.completed.len();
        let total_entries: usize = state.completed.iter().map(Record::entry_count).sum();

        let mut category_distribution: Vec<(String, usize)> = Vec::new();
        for record in &state.completed {
            match category_distribution
                .iter_mut()
                .find(|(category, _)| *category == record.category)
            {
                Some((_, count)) => *count += 1,
                None => category_distribution.push((record.category.clone(), 1)),
            }
        }

        let average_entries_per_record = if total_records == 0 {
            0.0
        } else {
            total_entries as f64 / total_records as f64
        };

        Self {
            total_records,
            total_entries,
            average_entries_per_record,
            category_distribution,
            finished_at: state.finished_at,
        }
    }
}
