use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use std::sync::Arc;

use crate::background::spawn_ingestion;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateRepoRequest, CreateRepoResponse, GetRepoResponse};
use crate::server::AppState;

pub async fn create_repo(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateRepoRequest>, JsonRejection>,
) -> ApiResult<Json<CreateRepoResponse>> {
    let Json(request) = body?;
    let repo = state.store.create(&request.repo_url).await?;

    spawn_ingestion(state.clone(), repo.clone());
    Ok(Json(CreateRepoResponse { repo }))
}

/// Status poll. In simulated mode every call moves indexing one step forward.
pub async fn get_repo(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
) -> ApiResult<Json<GetRepoResponse>> {
    let repo = if state.indexing_mode.advances_on_poll() {
        state.store.poll(&repo_id).await
    } else {
        state.store.get(&repo_id).await
    };

    repo.map(|repo| Json(GetRepoResponse { repo }))
        .ok_or_else(|| ApiError::not_found("Repo not found"))
}
