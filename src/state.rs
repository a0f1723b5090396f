use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::api::{HttpLoadTestApi, LoadTestApi};
use crate::catalog::RunCatalog;
use crate::charts::{BroadcastChartSink, LiveCharts};
use crate::config::{ConsoleConfig, EVENT_CHANNEL_CAPACITY, SERIES_CAPACITY};
use crate::display::ResultSummary;
use crate::lifecycle::{LifecycleSnapshot, LifecycleStatus};
use crate::model::RunResult;
use crate::notifications::NotificationCenter;
use crate::telemetry::TelemetryFrame;

pub type SharedSession = Arc<SessionState>;

/// Everything one dashboard session owns. Constructed once by the caller
/// and passed around by `Arc`; nothing here is process-global.
pub struct SessionState {
    pub config: ConsoleConfig,
    pub api: Arc<dyn LoadTestApi>,
    pub lifecycle: RwLock<LifecycleStatus>,
    pub charts: RwLock<LiveCharts>,
    pub chart_sink: Arc<BroadcastChartSink>,
    pub catalog: RwLock<RunCatalog>,
    pub display: RwLock<DisplayState>,
    /// Forwarded with the next submission; no other client-side effect.
    pub chaos_mode: RwLock<bool>,
    pub notifications: NotificationCenter,
    pub events_tx: broadcast::Sender<ConsoleEvent>,
}

/// What the dashboard is currently showing.
#[derive(Debug, Default)]
pub struct DisplayState {
    pub monitoring_visible: bool,
    pub last_frame: Option<TelemetryFrame>,
    pub summary: Option<ResultSummary>,
    pub result: Option<RunResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ConsoleEvent {
    Tick(TelemetryFrame),
    Lifecycle(LifecycleSnapshot),
}

impl SessionState {
    pub fn new(config: ConsoleConfig, api: Arc<dyn LoadTestApi>) -> Self {
        let chart_sink = Arc::new(BroadcastChartSink::new(EVENT_CHANNEL_CAPACITY));
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            api,
            lifecycle: RwLock::new(LifecycleStatus::new()),
            charts: RwLock::new(LiveCharts::new(SERIES_CAPACITY, chart_sink.clone())),
            chart_sink,
            catalog: RwLock::new(RunCatalog::new()),
            display: RwLock::new(DisplayState::default()),
            chaos_mode: RwLock::new(false),
            notifications: NotificationCenter::new(),
            events_tx,
        }
    }

    /// Session backed by the real HTTP service named in `config`.
    pub fn connect(config: ConsoleConfig) -> Result<Self, reqwest::Error> {
        // No request timeout: a load test may legitimately run for minutes.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .build()?;
        let api = Arc::new(HttpLoadTestApi::new(http_client, &config));
        Ok(Self::new(config, api))
    }

    pub fn publish(&self, event: ConsoleEvent) {
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleState;

    #[test]
    fn test_connect_builds_idle_session() {
        let state = SessionState::connect(ConsoleConfig::default()).unwrap();
        let lifecycle = state.lifecycle.try_read().unwrap();
        assert_eq!(lifecycle.state, LifecycleState::Idle);
        assert_eq!(lifecycle.run_seq, 0);
        drop(lifecycle);

        assert!(!*state.chaos_mode.try_read().unwrap());
        assert!(state.catalog.try_read().unwrap().is_empty());
        assert_eq!(
            state.charts.try_read().unwrap().lengths(),
            vec![0, 0, 0, 0, 0]
        );

        let display = state.display.try_read().unwrap();
        assert!(!display.monitoring_visible);
        assert!(display.summary.is_none());
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let state = SessionState::connect(ConsoleConfig::default()).unwrap();
        state.publish(ConsoleEvent::Lifecycle(
            state.lifecycle.try_read().unwrap().snapshot(),
        ));
    }
}
