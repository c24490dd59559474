//! Run event observers.
//!
//! The pipeline reports lifecycle events through an injected [`RunObserver`]
//! instead of a process-wide logger. [`TracingObserver`] is the default and
//! forwards events to `tracing`.

use tracing::{debug, info, warn};

use super::state::{ItemFailure, PipelineState, RunState};
use crate::records::{ItemDescriptor, ParseError, Record};

/// Receives pipeline lifecycle events. Every method defaults to a no-op.
///
/// Called synchronously on the driving task; keep implementations short.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _index_url: &str, _requested: usize) {}

    /// Index parsed: `found` descriptors before selection, `selected` after.
    fn index_parsed(&self, _found: usize, _selected: usize, _skipped: &[ParseError]) {}

    fn duplicate_descriptor(&self, _descriptor: &ItemDescriptor) {}

    /// `position` is 1-based.
    fn item_started(&self, _position: usize, _total: usize, _descriptor: &ItemDescriptor) {}

    fn item_completed(&self, _record: &Record) {}

    fn item_failed(&self, _failure: &ItemFailure) {}

    /// Item produced a record with no entries and was dropped.
    fn item_skipped(&self, _descriptor: &ItemDescriptor) {}

    fn run_finished(&self, _state: PipelineState, _run: &RunState) {}
}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn run_started(&self, index_url: &str, requested: usize) {
        info!(url = %index_url, requested, "starting run");
    }

    fn index_parsed(&self, found: usize, selected: usize, skipped: &[ParseError]) {
        for error in skipped {
            warn!(error = %error, "skipped index entry");
        }
        info!(found, selected, skipped = skipped.len(), "parsed index");
    }

    fn duplicate_descriptor(&self, descriptor: &ItemDescriptor) {
        warn!(item_id = %descriptor.id, url = %descriptor.url, "dropping duplicate descriptor");
    }

    fn item_started(&self, position: usize, total: usize, descriptor: &ItemDescriptor) {
        info!(
            position,
            total,
            item_id = %descriptor.id,
            title = %descriptor.title,
            "fetching item"
        );
    }

    fn item_completed(&self, record: &Record) {
        debug!(item_id = %record.id, entries = record.entry_count(), "item completed");
    }

    fn item_failed(&self, failure: &ItemFailure) {
        warn!(
            item_id = %failure.descriptor_id,
            url = %failure.url,
            kind = ?failure.kind,
            attempts = failure.attempts,
            reason = %failure.reason,
            "item failed"
        );
    }

    fn item_skipped(&self, descriptor: &ItemDescriptor) {
        info!(item_id = %descriptor.id, "skipping record with no entries");
    }

    fn run_finished(&self, state: PipelineState, run: &RunState) {
        info!(
            %state,
            completed = run.completed.len(),
            failed = run.failed.len(),
            skipped = run.skipped.len(),
            processed = run.processed(),
            requested = run.requested,
            "run finished"
        );
    }
}
