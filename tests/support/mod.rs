//! Shared fakes for pipeline integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fetchline_core::fetch::{Transport, TransportError};
use fetchline_core::pipeline::{ItemFailure, PipelineState, RunObserver, RunState};
use fetchline_core::records::{ItemDescriptor, ParseError, Record};
use tokio::time::Instant;

pub const INDEX_URL: &str = "https://example.test/index";

/// Detail URL for item number `n`.
pub fn item_url(n: usize) -> String {
    format!("https://example.test/items/{n}")
}

/// Index listing items `1..=count`, alternating categories `alpha`/`beta`.
pub fn index_json(count: usize) -> String {
    let items: Vec<serde_json::Value> = (1..=count)
        .map(|n| {
            serde_json::json!({
                "id": format!("item-{n}"),
                "url": item_url(n),
                "title": format!("Item {n}"),
                "category": if n % 2 == 1 { "alpha" } else { "beta" },
            })
        })
        .collect();
    serde_json::json!({ "items": items }).to_string()
}

/// Detail document with `entries` alternating actor/responder entries.
pub fn detail_json(n: usize, entries: usize) -> String {
    let entries: Vec<serde_json::Value> = (0..entries)
        .map(|i| {
            serde_json::json!({
                "role": if i % 2 == 0 { "user" } else { "assistant" },
                "content": format!("item {n} entry {i}"),
                "timestamp": format!("2024-01-01T00:00:0{i}Z"),
                "id": format!("m{i}"),
            })
        })
        .collect();
    serde_json::json!({ "title": format!("Item {n} detail"), "entries": entries }).to_string()
}

enum Route {
    Always(String),
    AlwaysFail(u16),
    Sequence(VecDeque<Result<String, u16>>),
}

/// In-memory transport answering from a script and recording every call.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `count` items, each answering with a two-entry detail.
    pub fn with_items(count: usize) -> Self {
        let transport = Self::new().ok(INDEX_URL, &index_json(count));
        (1..=count).fold(transport, |t, n| t.ok(&item_url(n), &detail_json(n, 2)))
    }

    pub fn ok(self, url: &str, body: &str) -> Self {
        self.set(url, Route::Always(body.to_string()))
    }

    pub fn fail(self, url: &str, status: u16) -> Self {
        self.set(url, Route::AlwaysFail(status))
    }

    /// Answers in order; 404 once exhausted.
    pub fn sequence(self, url: &str, responses: Vec<Result<&str, u16>>) -> Self {
        let queue = responses
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        self.set(url, Route::Sequence(queue))
    }

    fn set(self, url: &str, route: Route) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), route);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(url) {
            Some(Route::Always(body)) => Ok(body.clone()),
            Some(Route::AlwaysFail(status)) => Err(*status),
            Some(Route::Sequence(queue)) => queue.pop_front().unwrap_or(Err(404)),
            None => Err(404),
        };
        response.map_err(|status| TransportError::http_status(url, status))
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
    pub failures: Mutex<Vec<ItemFailure>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RunObserver for RecordingObserver {
    fn run_started(&self, _index_url: &str, requested: usize) {
        self.push(format!("started:{requested}"));
    }

    fn index_parsed(&self, found: usize, selected: usize, skipped: &[ParseError]) {
        self.push(format!("index:{found}:{selected}:{}", skipped.len()));
    }

    fn duplicate_descriptor(&self, descriptor: &ItemDescriptor) {
        self.push(format!("duplicate:{}", descriptor.id));
    }

    fn item_completed(&self, record: &Record) {
        self.push(format!("completed:{}", record.id));
    }

    fn item_failed(&self, failure: &ItemFailure) {
        self.push(format!("failed:{}", failure.descriptor_id));
        self.failures.lock().unwrap().push(failure.clone());
    }

    fn item_skipped(&self, descriptor: &ItemDescriptor) {
        self.push(format!("skipped:{}", descriptor.id));
    }

    fn run_finished(&self, state: PipelineState, _run: &RunState) {
        self.push(format!("finished:{state}"));
    }
}
