use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::models::HealthResponse;
use crate::server::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        indexing_mode: state.indexing_mode.to_string(),
        repos: state.store.len().await,
        uptime_seconds: state.uptime_seconds(),
    })
}
