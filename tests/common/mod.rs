#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use loadaudit_console::api::LoadTestApi;
use loadaudit_console::config::ConsoleConfig;
use loadaudit_console::error::ConsoleError;
use loadaudit_console::model::{HistoricalRun, HttpMethod, RunConfig, RunResult};
use loadaudit_console::state::{SessionState, SharedSession};

pub type Outcome = Result<RunResult, ConsoleError>;

/// Remote service stand-in. Each `start_test` call takes the next queued
/// receiver; a call with nothing queued never resolves.
#[derive(Default)]
pub struct MockApi {
    pending_starts: Mutex<VecDeque<oneshot::Receiver<Outcome>>>,
    pub start_calls: Mutex<Vec<RunConfig>>,
    pub runs: Mutex<Option<Vec<HistoricalRun>>>,
    pub list_calls: Mutex<usize>,
}

impl MockApi {
    /// Queue the outcome of the next `start_test`; send on the returned
    /// sender to resolve it.
    pub fn expect_start(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.pending_starts.lock().unwrap().push_back(rx);
        tx
    }

    /// `None` makes `/runs` fail.
    pub fn set_runs(&self, runs: Option<Vec<HistoricalRun>>) {
        *self.runs.lock().unwrap() = runs;
    }
}

impl LoadTestApi for MockApi {
    fn start_test(&self, config: RunConfig) -> BoxFuture<'static, Outcome> {
        self.start_calls.lock().unwrap().push(config);
        let rx = self.pending_starts.lock().unwrap().pop_front();
        async move {
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ConsoleError::NetworkFailure("dropped".into()))),
                None => futures::future::pending().await,
            }
        }
        .boxed()
    }

    fn list_runs(&self) -> BoxFuture<'static, Result<Vec<HistoricalRun>, ConsoleError>> {
        *self.list_calls.lock().unwrap() += 1;
        let runs = self.runs.lock().unwrap().clone();
        async move {
            runs.ok_or_else(|| ConsoleError::ServerError {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
        .boxed()
    }

    fn export(&self, run_id: Option<String>) -> BoxFuture<'static, Result<Bytes, ConsoleError>> {
        async move {
            match run_id.as_deref() {
                Some("missing") => Err(ConsoleError::ServerError {
                    status: 404,
                    body: "Run not found".to_string(),
                }),
                Some(id) => Ok(Bytes::from(format!("run_id,url\n{id},https://example.com\n"))),
                None => Ok(Bytes::from_static(b"run_id,url\n")),
            }
        }
        .boxed()
    }
}

pub fn session(api: Arc<MockApi>) -> SharedSession {
    Arc::new(SessionState::new(ConsoleConfig::default(), api))
}

pub fn run_config(num_users: u32, duration_seconds: u32) -> RunConfig {
    RunConfig {
        target_url: "https://example.com/api".to_string(),
        num_users,
        duration_seconds,
        method: HttpMethod::Get,
        headers: Default::default(),
        payload: serde_json::json!({}),
        chaos_mode: false,
    }
}

pub fn run_result(avg_latency: f64, error_rate: f64, throughput: f64, health_score: u32) -> RunResult {
    RunResult {
        avg_latency,
        error_rate,
        throughput,
        total_requests: 500,
        health_score,
        diagnosis: vec!["Latency is acceptable.".to_string()],
        max_latency: None,
        p95_latency: None,
        p99_latency: None,
        latency_stddev: None,
    }
}

pub fn historical(run_id: &str, avg_latency: f64, error_rate: f64, throughput: f64, health_score: u32) -> HistoricalRun {
    HistoricalRun {
        run_id: run_id.to_string(),
        url: "https://example.com/api".to_string(),
        users: 10,
        duration: 5,
        avg_latency,
        error_rate,
        throughput,
        health_score,
        method: None,
        total_requests: None,
        max_latency: None,
        p95_latency: None,
        p99_latency: None,
        latency_stddev: None,
    }
}

/// Resolve a queued start after `delay` of (possibly paused) time.
pub fn resolve_after(tx: oneshot::Sender<Outcome>, delay: Duration, outcome: Outcome) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(outcome);
    });
}
