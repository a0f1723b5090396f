use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::display::ResultSummary;
use crate::error::ConsoleError;
use crate::form::FormInput;
use crate::lifecycle::{self, LifecycleSnapshot};
use crate::notifications::NotificationKind;
use crate::state::SharedSession;
use crate::telemetry::TelemetryFrame;

#[derive(Serialize)]
pub struct TestStatusResponse {
    pub lifecycle: LifecycleSnapshot,
    pub monitoring_visible: bool,
    pub chaos_mode: bool,
    pub last_frame: Option<TelemetryFrame>,
    pub summary: Option<ResultSummary>,
}

/// POST /test: validate the form and start a run.
pub async fn start_test(
    State(state): State<SharedSession>,
    Json(form): Json<FormInput>,
) -> Result<impl IntoResponse, ConsoleError> {
    let chaos_mode = *state.chaos_mode.read().await;

    let parsed = match form.parse(chaos_mode) {
        Ok(parsed) => parsed,
        Err(e) => {
            state
                .notifications
                .emit(NotificationKind::Error, e.to_string())
                .await;
            return Err(e);
        }
    };

    for warning in &parsed.warnings {
        state
            .notifications
            .emit(NotificationKind::Warning, warning.clone())
            .await;
    }

    let handle = lifecycle::submit(&state, parsed.config).await?;

    Ok(Json(serde_json::json!({
        "status": "started",
        "run_seq": handle.run_seq,
        "warnings": parsed.warnings,
    })))
}

/// GET /test/status
pub async fn test_status(State(state): State<SharedSession>) -> Json<TestStatusResponse> {
    let lifecycle = state.lifecycle.read().await.snapshot();
    let chaos_mode = *state.chaos_mode.read().await;
    let display = state.display.read().await;

    Json(TestStatusResponse {
        lifecycle,
        monitoring_visible: display.monitoring_visible,
        chaos_mode,
        last_frame: display.last_frame.clone(),
        summary: display.summary.clone(),
    })
}

/// POST /test/stop-monitoring: stop the live charts; the server-side test
/// cannot be cancelled.
pub async fn stop_monitoring(State(state): State<SharedSession>) -> Json<serde_json::Value> {
    let stopped = lifecycle::stop_monitoring(&state).await;
    Json(serde_json::json!({
        "stopped": stopped,
    }))
}

/// POST /chaos: flip chaos mode for subsequent submissions.
pub async fn toggle_chaos(State(state): State<SharedSession>) -> Json<serde_json::Value> {
    let enabled = {
        let mut chaos = state.chaos_mode.write().await;
        *chaos = !*chaos;
        *chaos
    };
    tracing::info!("Chaos mode toggled: {}", enabled);

    Json(serde_json::json!({
        "chaos_mode": enabled,
    }))
}
