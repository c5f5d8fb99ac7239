use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use repochat_ingest::ingestion::pipeline::NoopObserver;
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::{IngestRequest, IngestResponse, PreviewFile};
use crate::server::AppState;

const PREVIEW_FILES: usize = 3;

/// One-shot clone, walk and cleanup.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(request) = body?;
    if request.repo_url.trim().is_empty() {
        return Err(ApiError::bad_request("repoUrl required"));
    }

    let target = state
        .pipeline
        .config()
        .github
        .resolve_clone_url(&request.repo_url)?;
    info!("One-shot ingestion of {}", target);
    let report = state
        .pipeline
        .ingest_clone(&target, &NoopObserver)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(IngestResponse {
        files_processed: report.files_processed(),
        preview: report
            .preview(PREVIEW_FILES)
            .iter()
            .map(|f| PreviewFile {
                path: f.path.clone(),
                content: f.content.clone(),
            })
            .collect(),
    }))
}
