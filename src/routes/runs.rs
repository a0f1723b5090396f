use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::diagnosis::{self, DiagnosisReport, HealthStatus, MetricStatus};
use crate::display::{RunConfiguration, RunRow, RunTable};
use crate::error::ConsoleError;
use crate::lifecycle;
use crate::model::HistoricalRun;
use crate::notifications::NotificationKind;
use crate::state::SharedSession;

#[derive(Serialize)]
pub struct RunDetailResponse {
    pub run: HistoricalRun,
    pub row: RunRow,
    pub health_status: HealthStatus,
    pub configuration: RunConfiguration,
    pub metric_statuses: Vec<MetricStatus>,
    pub diagnosis: DiagnosisReport,
}

/// GET /runs: refetch the catalog and return the table.
pub async fn list_runs(State(state): State<SharedSession>) -> Response {
    match lifecycle::refresh_catalog(&state).await {
        Ok(table) => Json(table).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(RunTable::from_error(&e))).into_response(),
    }
}

/// GET /runs/cached: the table as of the last successful refresh.
pub async fn cached_runs(State(state): State<SharedSession>) -> Json<RunTable> {
    let catalog = state.catalog.read().await;
    Json(RunTable::from_runs(catalog.runs()))
}

async fn lookup(state: &SharedSession, run_id: &str) -> Result<HistoricalRun, ConsoleError> {
    let found = state.catalog.read().await.find_by_id(run_id).cloned();
    if found.is_err() {
        state
            .notifications
            .emit(NotificationKind::Error, "Run data not found")
            .await;
    }
    found
}

/// GET /runs/{id}: detail view.
pub async fn run_detail(
    State(state): State<SharedSession>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetailResponse>, ConsoleError> {
    let run = lookup(&state, &run_id).await?;
    let metrics = run.metrics();
    Ok(Json(RunDetailResponse {
        row: RunRow::render(&run),
        health_status: HealthStatus::from_score(run.health_score),
        configuration: RunConfiguration::render(&run),
        metric_statuses: diagnosis::metric_statuses(&metrics),
        diagnosis: diagnosis::diagnose(&metrics),
        run,
    }))
}

/// GET /runs/{id}/diagnosis
pub async fn run_diagnosis(
    State(state): State<SharedSession>,
    Path(run_id): Path<String>,
) -> Result<Json<DiagnosisReport>, ConsoleError> {
    let run = lookup(&state, &run_id).await?;
    Ok(Json(diagnosis::diagnose(&run.metrics())))
}
