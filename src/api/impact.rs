use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{error_response, ApiResult};
use crate::error::validate_project_name;
use crate::graph::{self, DependencyArtifact, DependencyMap};
use crate::models::{ImpactRequest, ImpactResponse};
use crate::state::AppState;

/// POST /impact-analysis - Who breaks if this file changes
pub async fn impact_analysis(
    State(state): State<AppState>,
    Json(req): Json<ImpactRequest>,
) -> ApiResult<ImpactResponse> {
    let target = req.file_path.trim();
    if target.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "file_path is required".to_string()));
    }
    let project = validate_project_name(&req.project_name).map_err(error_response)?;

    // A project without a graph scores as having no dependents
    let artifact = state
        .ingestor
        .graphs()
        .load(&project)
        .map_err(error_response)?
        .unwrap_or_else(|| DependencyArtifact::Map(DependencyMap::new()));

    let result = graph::score(target, &artifact);
    tracing::info!(
        "Impact of {target} in {project}: score {} ({})",
        result.score,
        result.risk.as_str()
    );
    Ok(Json(result.into()))
}
