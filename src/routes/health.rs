use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::lifecycle::LifecycleState;
use crate::state::SharedSession;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub api_base: String,
    pub lifecycle: LifecycleState,
    pub catalog_loaded: bool,
    pub catalog_size: usize,
}

/// GET /health
pub async fn health(State(state): State<SharedSession>) -> Json<HealthResponse> {
    let lifecycle = state.lifecycle.read().await.state;
    let catalog = state.catalog.read().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_base: state.config.api_base.clone(),
        lifecycle,
        catalog_loaded: catalog.is_loaded(),
        catalog_size: catalog.len(),
    })
}
