use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{error_response, ApiResult};
use crate::models::{ErrorContextRequest, ErrorContextResponse, QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /query - Answer a question about an ingested project
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    let question = req.query.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query is required".to_string()));
    }

    let response = state
        .engine
        .query(&req.project_name, &req.session_id, question)
        .await
        .map_err(error_response)?;
    Ok(Json(QueryResponse { response }))
}

#[derive(Debug, Deserialize)]
pub struct ProjectParams {
    #[serde(default)]
    pub project_name: String,
}

/// GET /generate-architecture?project_name=
pub async fn generate_architecture(
    State(state): State<AppState>,
    Query(params): Query<ProjectParams>,
) -> ApiResult<serde_json::Value> {
    let overview = state
        .engine
        .architecture_overview(&params.project_name)
        .await
        .map_err(error_response)?;
    Ok(Json(serde_json::json!({ "architecture_overview": overview })))
}

/// POST /error-context - Traceback frames plus the nearest chunks
pub async fn error_context(
    State(state): State<AppState>,
    Json(req): Json<ErrorContextRequest>,
) -> ApiResult<ErrorContextResponse> {
    let context = state
        .engine
        .error_context(&req.project_name, &req.error_text)
        .await
        .map_err(error_response)?;
    Ok(Json(context))
}
