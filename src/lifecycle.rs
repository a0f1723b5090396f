//! The test lifecycle: Idle → Running → Complete | Failed → Running ...
//!
//! A submission starts two independent tasks, the synthetic telemetry
//! generator and the remote `/start` call. Only the remote call moves the
//! state machine out of Running; the generator just stops emitting when its
//! tick budget is spent. Both tasks carry the run sequence number they were
//! started for and drop their writes once a newer run has begun.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::display::{ResultSummary, RunTable};
use crate::error::ConsoleError;
use crate::model::{RunConfig, RunResult};
use crate::notifications::NotificationKind;
use crate::state::{ConsoleEvent, SharedSession};
use crate::telemetry::{progress_pct, SyntheticTelemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Running,
    Complete,
    Failed,
}

impl LifecycleState {
    pub fn accepts_submit(self) -> bool {
        self != LifecycleState::Running
    }
}

pub struct LifecycleStatus {
    pub state: LifecycleState,
    pub run_seq: u64,
    pub current: Option<RunConfig>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub ticks_emitted: u32,
    pub generator_running: bool,
    pub last_error: Option<String>,
    pub stop_tx: Option<watch::Sender<bool>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleSnapshot {
    pub state: LifecycleState,
    pub run_seq: u64,
    pub target_url: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub ticks_emitted: u32,
    pub duration: Option<u32>,
    pub progress_pct: f64,
    pub generator_running: bool,
    pub can_submit: bool,
    pub last_error: Option<String>,
}

impl LifecycleStatus {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            run_seq: 0,
            current: None,
            started_at: None,
            finished_at: None,
            ticks_emitted: 0,
            generator_running: false,
            last_error: None,
            stop_tx: None,
        }
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        let duration = self.current.as_ref().map(|c| c.duration_seconds);
        LifecycleSnapshot {
            state: self.state,
            run_seq: self.run_seq,
            target_url: self.current.as_ref().map(|c| c.target_url.clone()),
            started_at: self.started_at,
            finished_at: self.finished_at,
            ticks_emitted: self.ticks_emitted,
            duration,
            progress_pct: duration
                .map(|d| progress_pct(self.ticks_emitted, d))
                .unwrap_or(0.0),
            generator_running: self.generator_running,
            can_submit: self.state.accepts_submit(),
            last_error: self.last_error.clone(),
        }
    }

    /// Signal the generator to stop. Safe to call when it already has.
    fn stop_generator(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
    }
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handles to the two tasks a submission starts.
pub struct SubmitHandle {
    pub run_seq: u64,
    /// Resolves to the number of ticks emitted.
    pub generator: JoinHandle<u32>,
    /// Resolves to the state the remote result moved the lifecycle to.
    pub request: JoinHandle<LifecycleState>,
}

/// Start a test. Fails with `AlreadyRunning`, touching nothing, if one is
/// in flight.
pub async fn submit(session: &SharedSession, config: RunConfig) -> Result<SubmitHandle, ConsoleError> {
    submit_with(
        session,
        config.clone(),
        SyntheticTelemetry::new(config.num_users, config.duration_seconds),
    )
    .await
}

/// [`submit`] with a caller-supplied telemetry source.
pub async fn submit_with<R>(
    session: &SharedSession,
    config: RunConfig,
    telemetry: SyntheticTelemetry<R>,
) -> Result<SubmitHandle, ConsoleError>
where
    R: Rng + Send + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);

    let (run_seq, snapshot) = {
        let mut lc = session.lifecycle.write().await;
        if !lc.state.accepts_submit() {
            warn!("Submit rejected: run {} still in progress", lc.run_seq);
            return Err(ConsoleError::AlreadyRunning);
        }

        // Cleared under the lifecycle lock so no tick from an older run can
        // land in between.
        session.charts.write().await.clear();

        lc.state = LifecycleState::Running;
        lc.run_seq += 1;
        lc.current = Some(config.clone());
        lc.started_at = Some(Utc::now());
        lc.finished_at = None;
        lc.ticks_emitted = 0;
        lc.generator_running = true;
        lc.last_error = None;
        lc.stop_generator();
        lc.stop_tx = Some(stop_tx);
        (lc.run_seq, lc.snapshot())
    };

    {
        let mut display = session.display.write().await;
        display.monitoring_visible = true;
        display.last_frame = None;
    }
    session.publish(ConsoleEvent::Lifecycle(snapshot));

    info!(
        "Run {} started: {} {} with {} users for {}s{}",
        run_seq,
        config.method,
        config.target_url,
        config.num_users,
        config.duration_seconds,
        if config.chaos_mode { " (chaos mode)" } else { "" }
    );

    let generator = spawn_generator(session.clone(), run_seq, telemetry, stop_rx);

    let pending = session.api.start_test(config);
    let session_clone = session.clone();
    let request = tokio::spawn(async move {
        let outcome = pending.await;
        finish(&session_clone, run_seq, outcome).await
    });

    Ok(SubmitHandle {
        run_seq,
        generator,
        request,
    })
}

/// Emit one frame per tick interval until the frame budget is spent, the
/// stop signal fires, or a newer run takes over.
pub fn spawn_generator<R>(
    session: SharedSession,
    run_seq: u64,
    mut telemetry: SyntheticTelemetry<R>,
    mut stop_rx: watch::Receiver<bool>,
) -> JoinHandle<u32>
where
    R: Rng + Send + 'static,
{
    tokio::spawn(async move {
        let period = Duration::from_millis(session.config.tick_interval_ms);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut emitted = 0u32;

        while !telemetry.is_finished() {
            // A pending stop wins over a tick that is ready at the same time.
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        debug!("Run {}: generator stopped after {} ticks", run_seq, emitted);
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let Some(frame) = telemetry.next() else {
                break;
            };

            {
                let mut lc = session.lifecycle.write().await;
                if lc.run_seq != run_seq || lc.state != LifecycleState::Running {
                    debug!("Run {}: generator superseded", run_seq);
                    break;
                }
                lc.ticks_emitted = frame.tick;
                session.charts.write().await.push_frame(&frame);
            }

            session.display.write().await.last_frame = Some(frame.clone());
            session.publish(ConsoleEvent::Tick(frame));
            emitted += 1;
        }

        if telemetry.is_finished() {
            info!("Run {}: simulation completed ({} ticks)", run_seq, emitted);
        }

        let mut lc = session.lifecycle.write().await;
        if lc.run_seq == run_seq {
            lc.generator_running = false;
        }
        emitted
    })
}

/// Apply the remote outcome for `run_seq`. Outcomes for a run that is no
/// longer current are ignored.
async fn finish(
    session: &SharedSession,
    run_seq: u64,
    outcome: Result<RunResult, ConsoleError>,
) -> LifecycleState {
    let (terminal, snapshot) = {
        let mut lc = session.lifecycle.write().await;
        if lc.run_seq != run_seq || lc.state != LifecycleState::Running {
            debug!("Ignoring outcome for stale run {}", run_seq);
            return lc.state;
        }
        lc.stop_generator();
        lc.finished_at = Some(Utc::now());
        match &outcome {
            Ok(_) => lc.state = LifecycleState::Complete,
            Err(e) => {
                lc.state = LifecycleState::Failed;
                lc.last_error = Some(e.to_string());
            }
        }
        (lc.state, lc.snapshot())
    };

    {
        let mut display = session.display.write().await;
        display.monitoring_visible = false;
        // A failure leaves the previous run's summary on screen.
        if let Ok(result) = &outcome {
            display.summary = Some(ResultSummary::render(result));
            display.result = Some(result.clone());
        }
    }
    session.publish(ConsoleEvent::Lifecycle(snapshot));

    match outcome {
        Ok(result) => {
            info!(
                "Run {} completed: avg_latency={:.3}s error_rate={:.3} throughput={:.1} health={}",
                run_seq, result.avg_latency, result.error_rate, result.throughput, result.health_score
            );
            if !result.diagnosis.is_empty() {
                debug!("Diagnosis: {:?}", result.diagnosis);
            }
            session
                .notifications
                .emit(NotificationKind::Success, "Test completed successfully")
                .await;
            schedule_catalog_refresh(session.clone());
        }
        Err(e) => {
            error!("Run {} failed: {}", run_seq, e);
            session
                .notifications
                .emit(NotificationKind::Error, format!("Test failed: {e}"))
                .await;
        }
    }

    terminal
}

/// Refresh the catalog after the configured delay. The old rows stay up
/// until the new list arrives.
pub fn schedule_catalog_refresh(session: SharedSession) -> JoinHandle<Result<RunTable, ConsoleError>> {
    tokio::spawn(async move {
        let delay = session.config.catalog_refresh_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        refresh_catalog(&session).await
    })
}

/// Fetch past runs into the catalog and return the table to show.
pub async fn refresh_catalog(session: &SharedSession) -> Result<RunTable, ConsoleError> {
    match catalog::refresh(session.api.as_ref(), &session.catalog).await {
        Ok(runs) => Ok(RunTable::from_runs(&runs)),
        Err(e) => {
            session
                .notifications
                .emit(
                    NotificationKind::Warning,
                    format!("Error loading past runs: {e}"),
                )
                .await;
            Err(e)
        }
    }
}

/// Tear down the live telemetry for the current run. The remote call keeps
/// going; its result will still be applied.
pub async fn stop_monitoring(session: &SharedSession) -> bool {
    let mut lc = session.lifecycle.write().await;
    let was_running = lc.generator_running && lc.stop_tx.is_some();
    lc.stop_generator();
    was_running
}
