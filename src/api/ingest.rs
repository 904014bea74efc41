use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{error_response, ApiResult};
use crate::models::{IngestReport, IngestRequest};
use crate::state::AppState;

/// POST /ingest - Clone (or open) a project and rebuild its index
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> ApiResult<IngestReport> {
    let source = req.repo_url.trim();
    if source.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "repo_url is required".to_string()));
    }

    let report = state
        .ingestor
        .ingest(source, &req.project_name)
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}
