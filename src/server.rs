use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{events, export, health, runs, test_run};
use crate::state::SharedSession;

pub fn build_router(state: SharedSession) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health::health))
        // Test lifecycle
        .route("/test", post(test_run::start_test))
        .route("/test/status", get(test_run::test_status))
        .route("/test/stop-monitoring", post(test_run::stop_monitoring))
        .route("/chaos", post(test_run::toggle_chaos))
        // Past runs
        .route("/runs", get(runs::list_runs))
        .route("/runs/cached", get(runs::cached_runs))
        .route("/runs/{id}", get(runs::run_detail))
        .route("/runs/{id}/diagnosis", get(runs::run_diagnosis))
        // CSV passthrough
        .route("/export", get(export::export_all))
        .route("/export/{id}", get(export::export_run))
        // Live telemetry
        .route("/events", get(events::event_stream))
        .route("/charts", get(events::chart_snapshot))
        .route("/notifications", get(events::notification_history))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .with_state(state)
}
