//! The index-then-detail fetch pipeline.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::error::PipelineError;
use super::observer::{RunObserver, TracingObserver};
use super::options::PipelineOptions;
use super::state::{FailureKind, ItemFailure, PipelineState, RunOutcome, RunState, RunStats};
use crate::fetch::{
    CancelHandle, RateLimiter, RetryError, RetryExecutor, Transport, TransportError,
};
use crate::progress::{ProgressCallback, ProgressSnapshot, ProgressTracker};
use crate::records::{ItemDescriptor, Record, RecordParser};

/// Description attached to per-run progress trackers.
pub const PROGRESS_DESCRIPTION: &str = "Fetching records";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Fetched {
    Body { body: String, attempts: u32 },
    Cancelled,
    Failed(RetryError<TransportError>),
}

/// Moves the pipeline out of `Running` if the run future is dropped mid-flight.
struct RunningGuard<'a> {
    state: &'a Mutex<PipelineState>,
    run_state: &'a Mutex<RunState>,
    cancel: &'a CancelHandle,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if *state == PipelineState::Running {
            self.cancel.reset();
            *state = PipelineState::Cancelled;
            lock(self.run_state).finished_at = Some(Utc::now());
        }
    }
}

/// Fetches an index document, then each listed detail document in order.
///
/// The pipeline owns its rate limiter, retry executor and cancellation flag.
/// Transport and parser are injected. Share it behind an `Arc` to cancel or
/// read snapshots from other tasks while `run()` is in progress.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fetchline_core::fetch::HttpTransport;
/// use fetchline_core::pipeline::{FetchPipeline, PipelineOptions};
/// use fetchline_core::records::JsonRecordParser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = FetchPipeline::new(
///     PipelineOptions::new("https://example.com/index.json"),
///     Arc::new(HttpTransport::new()?),
///     Arc::new(JsonRecordParser::new()),
/// )?;
///
/// let outcome = pipeline.run(Some(10)).await?;
/// println!("{} records, {} failures", outcome.records.len(), outcome.failures.len());
/// # Ok(())
/// # }
/// ```
pub struct FetchPipeline {
    options: PipelineOptions,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn RecordParser>,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryExecutor,
    observer: Arc<dyn RunObserver>,
    cancel: CancelHandle,
    state: Mutex<PipelineState>,
    run_state: Mutex<RunState>,
    callbacks: Mutex<Vec<ProgressCallback>>,
    progress: Mutex<Option<Arc<ProgressTracker>>>,
}

impl std::fmt::Debug for FetchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPipeline")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl FetchPipeline {
    /// Creates a pipeline with a rate limiter built from `options.min_interval`
    /// and a [`TracingObserver`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `options` fail validation.
    pub fn new(
        options: PipelineOptions,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn RecordParser>,
    ) -> Result<Self, PipelineError> {
        options.validate()?;
        let rate_limiter = Arc::new(RateLimiter::new(options.min_interval));
        let retry = RetryExecutor::new(options.retry_policy.clone());

        debug!(
            url = %options.index_url,
            max_items = options.max_items,
            max_retries = options.retry_policy.max_retries(),
            min_interval_ms = options.min_interval.as_millis(),
            "creating fetch pipeline"
        );

        Ok(Self {
            options,
            transport,
            parser,
            rate_limiter,
            retry,
            observer: Arc::new(TracingObserver),
            cancel: CancelHandle::new(),
            state: Mutex::new(PipelineState::Idle),
            run_state: Mutex::new(RunState::default()),
            callbacks: Mutex::new(Vec::new()),
            progress: Mutex::new(None),
        })
    }

    /// Replaces the rate limiter, e.g. to share one clock across pipelines.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Replaces the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the run options.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Registers a progress callback for this and every later run.
    pub fn on_progress(&self, callback: ProgressCallback) {
        if let Some(tracker) = lock(&self.progress).as_ref() {
            tracker.add_callback(Arc::clone(&callback));
        }
        lock(&self.callbacks).push(callback);
    }

    /// Requests cancellation of the current run, or of the next one when idle.
    pub fn cancel(&self) {
        debug!("cancellation requested");
        self.cancel.cancel();
    }

    /// Returns a handle that cancels this pipeline from anywhere.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    /// Returns a snapshot of the current or last run.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        lock(&self.run_state).clone()
    }

    /// Returns progress of the current or last run, if one has started.
    #[must_use]
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        lock(&self.progress).as_ref().map(|tracker| tracker.snapshot())
    }

    /// Returns statistics over the records of the current or last run.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        RunStats::from_run_state(&lock(&self.run_state))
    }

    /// Runs the pipeline once.
    ///
    /// `max_items` can lower, never raise, the configured bound. The outcome
    /// holds every record appended before the run stopped, in index order,
    /// together with per-item failures.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AlreadyRunning`] if a run is in progress
    /// - [`PipelineError::IndexFetch`] if the index cannot be fetched
    #[instrument(skip(self), fields(url = %self.options.index_url))]
    pub async fn run(&self, max_items: Option<usize>) -> Result<RunOutcome, PipelineError> {
        let requested = self.options.requested(max_items);
        let guard = self.begin_run(requested)?;
        self.observer.run_started(&self.options.index_url, requested);

        if requested == 0 {
            return Ok(self.finish(guard, PipelineState::Completed));
        }

        let body = match self.fetch(&self.options.index_url).await {
            Fetched::Body { body, .. } => body,
            Fetched::Cancelled => return Ok(self.finish(guard, PipelineState::Cancelled)),
            Fetched::Failed(source) => {
                self.finish(guard, PipelineState::Failed);
                return Err(PipelineError::IndexFetch {
                    url: self.options.index_url.clone(),
                    source,
                });
            }
        };

        let index = self.parser.parse_index(&body);
        let found = index.len();
        let descriptors = self.select(index.descriptors, requested);
        self.observer
            .index_parsed(found, descriptors.len(), &index.skipped);

        let tracker = self.start_progress(descriptors.len());
        let total = descriptors.len();

        for (position, descriptor) in descriptors.iter().enumerate() {
            if self.cancel.is_cancelled() {
                debug!(remaining = total - position, "cancellation observed");
                return Ok(self.finish(guard, PipelineState::Cancelled));
            }

            self.observer.item_started(position + 1, total, descriptor);

            match self.fetch(&descriptor.url).await {
                Fetched::Body { body, attempts } => {
                    if self.process_body(&body, attempts, descriptor) {
                        tracker.update(1);
                    }
                }
                Fetched::Failed(error) => {
                    self.record_failure(descriptor, FailureKind::Fetch, &error, error.attempts());
                }
                Fetched::Cancelled => {
                    return Ok(self.finish(guard, PipelineState::Cancelled));
                }
            }
        }

        let final_state = if self.cancel.is_cancelled() {
            PipelineState::Cancelled
        } else {
            PipelineState::Completed
        };
        Ok(self.finish(guard, final_state))
    }

    fn begin_run(&self, requested: usize) -> Result<RunningGuard<'_>, PipelineError> {
        {
            let mut state = lock(&self.state);
            if *state == PipelineState::Running {
                return Err(PipelineError::AlreadyRunning);
            }
            *state = PipelineState::Running;
        }
        *lock(&self.run_state) = RunState::started(requested);
        *lock(&self.progress) = None;

        Ok(RunningGuard {
            state: &self.state,
            run_state: &self.run_state,
            cancel: &self.cancel,
        })
    }

    fn finish(&self, guard: RunningGuard<'_>, final_state: PipelineState) -> RunOutcome {
        let snapshot = {
            let mut run = lock(&self.run_state);
            run.finished_at = Some(Utc::now());
            run.clone()
        };
        // Requests are consumed by the run they stopped; one made while idle
        // applies to the next run.
        self.cancel.reset();
        *lock(&self.state) = final_state;
        drop(guard);

        self.observer.run_finished(final_state, &snapshot);
        RunOutcome {
            state: final_state,
            records: snapshot.completed,
            failures: snapshot.failed,
            skipped: snapshot.skipped,
        }
    }

    /// One rate-limit grant, then attempts under the retry policy.
    async fn fetch(&self, url: &str) -> Fetched {
        self.rate_limiter.acquire().await;
        if self.cancel.is_cancelled() {
            debug!(url = %url, "cancelled while waiting for rate limiter");
            return Fetched::Cancelled;
        }

        let mut attempts = 0;
        let result = self
            .retry
            .execute(&self.cancel, |attempt| {
                attempts = attempt + 1;
                self.transport.get(url)
            })
            .await;

        match result {
            Ok(body) => Fetched::Body { body, attempts },
            Err(error) if error.is_cancelled() => Fetched::Cancelled,
            Err(error) => Fetched::Failed(error),
        }
    }

    /// Drops duplicate ids, applies the category filter, then truncates.
    fn select(&self, descriptors: Vec<ItemDescriptor>, requested: usize) -> Vec<ItemDescriptor> {
        let mut seen = HashSet::new();
        descriptors
            .into_iter()
            .filter(|descriptor| {
                let first = seen.insert(descriptor.id.clone());
                if !first {
                    self.observer.duplicate_descriptor(descriptor);
                }
                first
            })
            .filter(|descriptor| self.options.accepts_category(&descriptor.category))
            .take(requested)
            .collect()
    }

    fn start_progress(&self, total: usize) -> Arc<ProgressTracker> {
        let tracker = Arc::new(ProgressTracker::new(total, PROGRESS_DESCRIPTION));
        for callback in lock(&self.callbacks).iter() {
            tracker.add_callback(Arc::clone(callback));
        }
        *lock(&self.progress) = Some(Arc::clone(&tracker));
        tracker
    }

    /// Parses a detail body and files the result. Returns true if a record was appended.
    fn process_body(&self, body: &str, attempts: u32, descriptor: &ItemDescriptor) -> bool {
        let mut record = match self.parser.parse_detail(body, descriptor) {
            Ok(record) => record,
            Err(error) => {
                self.record_failure(descriptor, FailureKind::Parse, &error, attempts);
                return false;
            }
        };

        if record.id != descriptor.id {
            warn!(
                item_id = %descriptor.id,
                parsed_id = %record.id,
                "parser returned a different id, keeping the descriptor id"
            );
            record.id.clone_from(&descriptor.id);
        }

        if !self.options.include_timestamps {
            record.strip_timestamps();
        }

        if self.options.skip_empty_records && record.is_empty() {
            lock(&self.run_state).skipped.push(descriptor.id.clone());
            self.observer.item_skipped(descriptor);
            return false;
        }

        self.observer.item_completed(&record);
        self.append(record);
        true
    }

    fn append(&self, record: Record) {
        lock(&self.run_state).completed.push(record);
    }

    fn record_failure(
        &self,
        descriptor: &ItemDescriptor,
        kind: FailureKind,
        error: &dyn std::error::Error,
        attempts: u32,
    ) {
        let failure = ItemFailure {
            descriptor_id: descriptor.id.clone(),
            url: descriptor.url.clone(),
            kind,
            reason: error.to_string(),
            attempts,
        };
        self.observer.item_failed(&failure);
        lock(&self.run_state).failed.push(failure);
    }
}
