use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::{ChatRequest, ChatResponse};
use crate::server::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = body?;
    if request.repo_id.is_empty() {
        return Err(ApiError::bad_request("repoId required"));
    }

    let message = state
        .responder
        .respond(&request)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(ChatResponse { message }))
}
