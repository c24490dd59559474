//! Integration tests for the fetch pipeline.
//!
//! Most tests drive the pipeline with a scripted in-memory transport on a
//! paused clock, so rate-limit and backoff waits cost no real time. The last
//! section runs the real HTTP transport against a mock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fetchline_core::fetch::{
    BoxError, HttpTransport, RateLimiter, RetryError, RetryPolicy, Transport, TransportError,
};
use fetchline_core::pipeline::{
    FailureKind, FetchPipeline, PipelineError, PipelineOptions, PipelineState, RunObserver,
};
use fetchline_core::progress::ProgressSnapshot;
use fetchline_core::records::{
    EntryRole, IndexParse, ItemDescriptor, JsonRecordParser, ParseError, Record, RecordParser,
};
use tokio::time::Instant;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{
    INDEX_URL, RecordingObserver, ScriptedTransport, detail_json, index_json, item_url,
};

// ==================== Helper Functions ====================

/// Options with no rate limiting and a short deterministic backoff.
fn test_options(max_retries: u32) -> PipelineOptions {
    PipelineOptions::new(INDEX_URL)
        .with_min_interval(Duration::ZERO)
        .with_retry_policy(RetryPolicy::new(
            max_retries,
            Duration::from_millis(100),
            2.0,
        ))
}

fn pipeline_with(
    options: PipelineOptions,
    transport: &Arc<ScriptedTransport>,
) -> Arc<FetchPipeline> {
    Arc::new(
        FetchPipeline::new(
            options,
            Arc::clone(transport) as Arc<dyn Transport>,
            Arc::new(JsonRecordParser::new()),
        )
        .unwrap(),
    )
}

fn record_ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

// ==================== Core Scenario Tests ====================

#[tokio::test(start_paused = true)]
async fn test_run_truncates_to_requested_in_index_order() {
    let transport = Arc::new(ScriptedTransport::with_items(5));
    let pipeline = pipeline_with(test_options(3), &transport);

    let outcome = pipeline.run(Some(3)).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert_eq!(record_ids(&outcome.records), vec!["item-1", "item-2", "item-3"]);
    assert!(outcome.failures.is_empty());
    assert_eq!(
        transport.calls(),
        vec![INDEX_URL.to_string(), item_url(1), item_url(2), item_url(3)]
    );
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_run_item_failure_is_recorded_and_run_continues() {
    let transport = Arc::new(ScriptedTransport::with_items(3).fail(&item_url(2), 503));
    let pipeline = pipeline_with(test_options(2), &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert_eq!(record_ids(&outcome.records), vec!["item-1", "item-3"]);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.descriptor_id, "item-2");
    assert_eq!(failure.kind, FailureKind::Fetch);
    assert_eq!(failure.attempts, 3);
    assert!(failure.reason.contains("503"), "reason: {}", failure.reason);
    assert_eq!(transport.call_count(&item_url(2)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_first_record_stops_before_next_fetch() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let pipeline = pipeline_with(test_options(3), &transport);

    let cancel = pipeline.cancel_handle();
    pipeline.on_progress(Arc::new(move |snapshot: &ProgressSnapshot| {
        if snapshot.current == 1 {
            cancel.cancel();
        }
        Ok(())
    }));

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Cancelled);
    assert!(outcome.was_cancelled());
    assert_eq!(record_ids(&outcome.records), vec!["item-1"]);
    assert_eq!(transport.call_count(&item_url(2)), 0);
    assert_eq!(transport.call_count(&item_url(3)), 0);
    assert_eq!(pipeline.state(), PipelineState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_index_exhaustion_fails_run_without_detail_fetches() {
    let transport = Arc::new(ScriptedTransport::new().fail(INDEX_URL, 500));
    let pipeline = pipeline_with(test_options(2), &transport);
    let start = Instant::now();

    let result = pipeline.run(None).await;

    match result {
        Err(PipelineError::IndexFetch { url, source }) => {
            assert_eq!(url, INDEX_URL);
            assert!(matches!(source, RetryError::Exhausted { attempts: 3, .. }));
            assert!(matches!(
                source.last_error(),
                TransportError::HttpStatus { status: 500, .. }
            ));
        }
        other => panic!("expected IndexFetch, got {other:?}"),
    }
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(transport.calls().len(), 3);
    assert!(transport.calls().iter().all(|url| url == INDEX_URL));
    // 100ms + 200ms of backoff
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(305));
}

#[tokio::test(start_paused = true)]
async fn test_zero_requested_completes_without_fetching() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let pipeline = pipeline_with(test_options(3), &transport);

    let outcome = pipeline.run(Some(0)).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert!(outcome.records.is_empty());
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_index_completes_without_detail_fetches() {
    let transport = Arc::new(ScriptedTransport::new().ok(INDEX_URL, "[]"));
    let pipeline = pipeline_with(test_options(3), &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert!(outcome.records.is_empty());
    assert_eq!(transport.calls(), vec![INDEX_URL.to_string()]);
}

// ==================== Retry and Cancellation Tests ====================

#[tokio::test(start_paused = true)]
async fn test_transient_item_failure_recovers_on_retry() {
    let transport = Arc::new(ScriptedTransport::with_items(2).sequence(
        &item_url(1),
        vec![Err(503), Err(502), Ok(detail_json(1, 1).as_str())],
    ));
    let pipeline = pipeline_with(test_options(3), &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(record_ids(&outcome.records), vec!["item-1", "item-2"]);
    assert!(outcome.failures.is_empty());
    assert_eq!(transport.call_count(&item_url(1)), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_returns_promptly() {
    let transport = Arc::new(ScriptedTransport::with_items(2).fail(&item_url(1), 503));
    let options = test_options(3).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_secs(10),
        2.0,
    ));
    let pipeline = pipeline_with(options, &transport);

    let cancel = pipeline.cancel_handle();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let start = Instant::now();
    let outcome = pipeline.run(None).await.unwrap();
    canceller.await.unwrap();

    assert_eq!(outcome.state, PipelineState::Cancelled);
    assert!(outcome.records.is_empty());
    assert!(outcome.failures.is_empty());
    assert_eq!(transport.call_count(&item_url(1)), 1);
    assert_eq!(transport.call_count(&item_url(2)), 0);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_index_backoff_returns_empty_cancelled() {
    let transport = Arc::new(ScriptedTransport::new().fail(INDEX_URL, 503));
    let options = test_options(3).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_secs(30),
        2.0,
    ));
    let pipeline = pipeline_with(options, &transport);

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Cancelled);
    assert!(outcome.records.is_empty());
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_run_stops_it_without_requests() {
    let transport = Arc::new(ScriptedTransport::with_items(2));
    let pipeline = pipeline_with(test_options(0), &transport);

    pipeline.cancel();
    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Cancelled);
    assert!(outcome.records.is_empty());
    assert!(transport.calls().is_empty());

    // The request was consumed by the run it stopped.
    let next = pipeline.run(None).await.unwrap();
    assert_eq!(next.state, PipelineState::Completed);
    assert_eq!(next.records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_does_not_carry_over_to_next_run() {
    let transport = Arc::new(ScriptedTransport::with_items(2));
    let pipeline = pipeline_with(test_options(0), &transport);

    let cancel = pipeline.cancel_handle();
    let fired = Arc::new(AtomicBool::new(false));
    {
        let fired = Arc::clone(&fired);
        pipeline.on_progress(Arc::new(move |_: &ProgressSnapshot| {
            if !fired.swap(true, Ordering::SeqCst) {
                cancel.cancel();
            }
            Ok(())
        }));
    }

    let first = pipeline.run(None).await.unwrap();
    let second = pipeline.run(None).await.unwrap();

    assert_eq!(first.state, PipelineState::Cancelled);
    assert_eq!(record_ids(&first.records), vec!["item-1"]);
    assert_eq!(second.state, PipelineState::Completed);
    assert_eq!(record_ids(&second.records), vec!["item-1", "item-2"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_rate_limit_wait_skips_next_request() {
    let transport = Arc::new(ScriptedTransport::with_items(2));
    let options = test_options(0).with_min_interval(Duration::from_secs(2));
    let pipeline = pipeline_with(options, &transport);

    // Index is granted at t=0, item 1 waits until t=2.
    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Cancelled);
    assert!(outcome.records.is_empty());
    assert_eq!(transport.calls(), vec![INDEX_URL.to_string()]);
}

// ==================== State Machine Tests ====================

#[tokio::test(start_paused = true)]
async fn test_run_while_running_fails_fast() {
    let transport = Arc::new(ScriptedTransport::new().fail(INDEX_URL, 503));
    let options = test_options(3).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_secs(60),
        2.0,
    ));
    let pipeline = pipeline_with(options, &transport);

    let background = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.run(None).await })
    };
    while pipeline.state() != PipelineState::Running {
        tokio::task::yield_now().await;
    }

    let second = pipeline.run(None).await;
    assert!(matches!(second, Err(PipelineError::AlreadyRunning)));

    pipeline.cancel();
    let first = background.await.unwrap().unwrap();
    assert_eq!(first.state, PipelineState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_run_future_leaves_pipeline_cancelled() {
    let transport = Arc::new(ScriptedTransport::new().fail(INDEX_URL, 503));
    let options = test_options(3).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_secs(60),
        2.0,
    ));
    let pipeline = pipeline_with(options, &transport);

    let timed_out = tokio::time::timeout(Duration::from_secs(1), pipeline.run(None)).await;

    assert!(timed_out.is_err());
    assert_eq!(pipeline.state(), PipelineState::Cancelled);
    assert!(pipeline.run_state().finished_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_can_run_again_after_finishing() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let pipeline = pipeline_with(test_options(0), &transport);

    let first = pipeline.run(Some(1)).await.unwrap();
    let second = pipeline.run(Some(2)).await.unwrap();

    assert_eq!(record_ids(&first.records), vec!["item-1"]);
    assert_eq!(record_ids(&second.records), vec!["item-1", "item-2"]);
    assert_eq!(pipeline.run_state().requested, 2);
    assert_eq!(pipeline.stats().total_records, 2);
}

// ==================== Selection and Record Handling Tests ====================

#[tokio::test(start_paused = true)]
async fn test_duplicates_dropped_and_category_filter_applied_before_truncation() {
    let index = serde_json::json!([
        {"id": "a", "url": item_url(1), "category": "alpha"},
        {"id": "a", "url": item_url(2), "category": "alpha"},
        {"id": "b", "url": item_url(3), "category": "beta"},
        {"id": "c", "url": item_url(4), "category": "alpha"},
        {"id": "d", "url": item_url(5), "category": "alpha"},
    ])
    .to_string();
    let transport = Arc::new(
        (1..=5).fold(ScriptedTransport::new().ok(INDEX_URL, &index), |t, n| {
            t.ok(&item_url(n), &detail_json(n, 2))
        }),
    );
    let observer = RecordingObserver::new();
    let options = test_options(0).with_filter_categories(vec!["alpha".to_string()]);
    let pipeline = Arc::new(
        FetchPipeline::new(
            options,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(JsonRecordParser::new()),
        )
        .unwrap()
        .with_observer(Arc::clone(&observer) as Arc<dyn RunObserver>),
    );

    let outcome = pipeline.run(Some(2)).await.unwrap();

    assert_eq!(record_ids(&outcome.records), vec!["a", "c"]);
    assert_eq!(transport.call_count(&item_url(2)), 0);
    assert_eq!(transport.call_count(&item_url(3)), 0);
    let events = observer.events();
    assert!(events.contains(&"duplicate:a".to_string()));
    assert!(events.contains(&"index:5:2:0".to_string()));
    assert_eq!(events.last().unwrap(), "finished:completed");
}

#[tokio::test(start_paused = true)]
async fn test_empty_records_skipped_when_configured() {
    let transport = Arc::new(ScriptedTransport::with_items(3).ok(&item_url(2), &detail_json(2, 0)));
    let pipeline = pipeline_with(test_options(0), &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(record_ids(&outcome.records), vec!["item-1", "item-3"]);
    assert_eq!(outcome.skipped, vec!["item-2".to_string()]);
    assert!(outcome.failures.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_records_kept_when_not_skipping() {
    let transport = Arc::new(ScriptedTransport::with_items(2).ok(&item_url(2), &detail_json(2, 0)));
    let mut options = test_options(0);
    options.skip_empty_records = false;
    let pipeline = pipeline_with(options, &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert!(outcome.records[1].is_empty());
    assert!(outcome.skipped.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timestamps_stripped_when_disabled() {
    let transport = Arc::new(ScriptedTransport::with_items(1));
    let mut options = test_options(0);
    options.include_timestamps = false;
    let pipeline = pipeline_with(options, &transport);

    let outcome = pipeline.run(None).await.unwrap();

    let record = &outcome.records[0];
    assert_eq!(record.entries.len(), 2);
    assert_eq!(record.entries[0].role, EntryRole::Actor);
    assert!(record.entries.iter().all(|e| e.timestamp.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_parse_failure_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::with_items(2).ok(&item_url(1), "<html>"));
    let pipeline = pipeline_with(test_options(3), &transport);

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(record_ids(&outcome.records), vec!["item-2"]);
    assert_eq!(outcome.failures[0].kind, FailureKind::Parse);
    assert_eq!(outcome.failures[0].attempts, 1);
    assert_eq!(transport.call_count(&item_url(1)), 1);
}

// ==================== Progress, Stats and Pacing Tests ====================

#[tokio::test(start_paused = true)]
async fn test_progress_reaches_complete_on_full_success() {
    let transport = Arc::new(ScriptedTransport::with_items(4));
    let pipeline = pipeline_with(test_options(0), &transport);
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        pipeline.on_progress(Arc::new(move |snapshot: &ProgressSnapshot| {
            seen.lock().unwrap().push((snapshot.current, snapshot.total));
            Ok(())
        }));
    }

    pipeline.run(None).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    let progress = pipeline.progress().unwrap();
    assert!((progress.percentage - 100.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn test_failing_progress_callback_does_not_abort_run() {
    let transport = Arc::new(ScriptedTransport::with_items(2));
    let pipeline = pipeline_with(test_options(0), &transport);
    pipeline.on_progress(Arc::new(|_: &ProgressSnapshot| {
        Err(BoxError::from("display gone"))
    }));

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stats_reflect_last_run_and_are_idempotent() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let pipeline = pipeline_with(test_options(0), &transport);

    pipeline.run(None).await.unwrap();

    let first = pipeline.stats();
    let second = pipeline.stats();
    assert_eq!(first, second);
    assert_eq!(first.total_records, 3);
    assert_eq!(first.total_entries, 6);
    assert!((first.average_entries_per_record - 2.0).abs() < f64::EPSILON);
    assert_eq!(
        first.category_distribution,
        vec![("alpha".to_string(), 2), ("beta".to_string(), 1)]
    );
    assert!(first.finished_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced_by_min_interval() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let options = test_options(0).with_min_interval(Duration::from_secs(2));
    let pipeline = pipeline_with(options, &transport);

    pipeline.run(None).await.unwrap();

    let times = transport.call_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_secs(2), "gap {gap:?}");
        assert!(gap < Duration::from_millis(2100), "gap {gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_shared_rate_limiter_spaces_requests_across_pipelines() {
    let transport = Arc::new(ScriptedTransport::with_items(2));
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(2)));
    let build = || {
        FetchPipeline::new(
            test_options(0),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(JsonRecordParser::new()),
        )
        .unwrap()
        .with_rate_limiter(Arc::clone(&limiter))
    };
    let first = build();
    let second = build();

    let (a, b) = tokio::join!(first.run(None), second.run(None));

    assert_eq!(a.unwrap().records.len(), 2);
    assert_eq!(b.unwrap().records.len(), 2);
    let mut times = transport.call_times();
    times.sort();
    assert_eq!(times.len(), 6);
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_secs(2), "gap {gap:?}");
    }
    assert_eq!(limiter.cumulative_delay(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_record_id_follows_descriptor_whatever_the_parser_returns() {
    let transport = Arc::new(ScriptedTransport::with_items(3));
    let pipeline = FetchPipeline::new(
        test_options(0),
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(FixedIdParser(JsonRecordParser::new())),
    )
    .unwrap();

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(record_ids(&outcome.records), vec!["item-1", "item-2", "item-3"]);
}

/// Parser that stamps the same id on every record.
struct FixedIdParser(JsonRecordParser);

impl RecordParser for FixedIdParser {
    fn parse_index(&self, body: &str) -> IndexParse {
        self.0.parse_index(body)
    }

    fn parse_detail(&self, body: &str, descriptor: &ItemDescriptor) -> Result<Record, ParseError> {
        let mut record = self.0.parse_detail(body, descriptor)?;
        record.id = "same".to_string();
        Ok(record)
    }
}

// ==================== HTTP End-to-End Tests ====================

#[tokio::test]
async fn test_http_pipeline_end_to_end_with_relative_urls() {
    let server = MockServer::start().await;
    let index = serde_json::json!({"items": [
        {"id": "1", "url": "/items/1", "title": "One", "bot_name": "alpha"},
        {"id": "2", "url": "/items/2", "title": "Two", "bot_name": "beta"},
        {"id": "3", "url": "/items/3", "title": "Three", "bot_name": "alpha"},
    ]});

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_json(1, 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_json(3, 1)))
        .mount(&server)
        .await;

    let index_url = format!("{}/index", server.uri());
    let options = PipelineOptions::new(&index_url)
        .with_min_interval(Duration::ZERO)
        .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(10), 2.0));
    let pipeline = FetchPipeline::new(
        options,
        Arc::new(HttpTransport::with_timeout(Duration::from_secs(5)).unwrap()),
        Arc::new(JsonRecordParser::with_base_url(Url::parse(&index_url).unwrap())),
    )
    .unwrap();

    let outcome = pipeline.run(None).await.unwrap();

    assert_eq!(outcome.state, PipelineState::Completed);
    assert_eq!(record_ids(&outcome.records), vec!["1", "3"]);
    assert_eq!(outcome.records[0].entries.len(), 3);
    assert_eq!(outcome.records[0].category, "alpha");
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].url, format!("{}/items/2", server.uri()));
    assert_eq!(outcome.failures[0].attempts, 2);
}

#[tokio::test]
async fn test_http_pipeline_index_not_found_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let options = PipelineOptions::new(format!("{}/index", server.uri()))
        .with_min_interval(Duration::ZERO)
        .with_retry_policy(RetryPolicy::new(0, Duration::from_millis(10), 2.0));
    let pipeline = FetchPipeline::new(
        options,
        Arc::new(HttpTransport::new().unwrap()),
        Arc::new(JsonRecordParser::new()),
    )
    .unwrap();

    let result = pipeline.run(None).await;

    assert!(matches!(result, Err(PipelineError::IndexFetch { .. })));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn test_index_json_helper_lists_items() {
    let body = index_json(2);
    assert!(body.contains("item-2"));
}
