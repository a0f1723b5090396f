use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ConsoleError;
use crate::notifications::NotificationKind;
use crate::state::SharedSession;

async fn proxy_export(
    state: &SharedSession,
    run_id: Option<String>,
) -> Result<impl IntoResponse, ConsoleError> {
    let filename = match &run_id {
        Some(id) => format!("loadaudit_run_{id}.csv"),
        None => "load_test_results.csv".to_string(),
    };
    let label = run_id.clone();

    match state.api.export(run_id).await {
        Ok(body) => {
            let message = match label {
                Some(id) => format!("Run {id} exported successfully"),
                None => "Results exported successfully".to_string(),
            };
            state
                .notifications
                .emit(NotificationKind::Success, message)
                .await;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                body,
            ))
        }
        Err(e) => {
            state
                .notifications
                .emit(NotificationKind::Error, format!("Export failed: {e}"))
                .await;
            Err(e)
        }
    }
}

/// GET /export
pub async fn export_all(
    State(state): State<SharedSession>,
) -> Result<impl IntoResponse, ConsoleError> {
    proxy_export(&state, None).await
}

/// GET /export/{id}
pub async fn export_run(
    State(state): State<SharedSession>,
    Path(run_id): Path<String>,
) -> Result<impl IntoResponse, ConsoleError> {
    proxy_export(&state, Some(run_id)).await
}
