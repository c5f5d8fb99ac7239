use axum::Json;
use axum::extract::{Path, Query, State};
use std::sync::Arc;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::fixtures::fixture_file;
use crate::highlight::language_from_path;
use crate::models::{FileQuery, FileResponse};
use crate::server::AppState;

/// Serve one file of a repository as highlighted HTML.
///
/// Ingested content wins; otherwise the built-in sample files are used, for
/// any repository id.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(repo_id): Path<String>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Json<FileResponse>> {
    let path = query
        .path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("path query param is required"))?;

    let raw = match state.store.snapshot_file(&repo_id, &path).await {
        Some(content) => content,
        None => fixture_file(&path)
            .map(str::to_string)
            .ok_or_else(|| ApiError::not_found(format!("File not found: {path}")))?,
    };

    let language = language_from_path(&path);
    debug!("Highlighting {} as {} ({} bytes)", path, language, raw.len());

    // Snapshots can be up to the walker's size cap; keep syntect off the runtime
    let highlighter = Arc::clone(&state.highlighter);
    let source = raw.clone();
    let html = tokio::task::spawn_blocking(move || highlighter.highlight(&source, language))
        .await
        .map_err(|e| ApiError::Internal(format!("Highlighting task failed: {e}")))??;

    Ok(Json(FileResponse {
        path,
        language: language.to_string(),
        html,
        raw,
    }))
}
