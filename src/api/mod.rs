pub mod impact;
pub mod ingest;
pub mod query;

use axum::http::StatusCode;
use axum::Json;

use crate::error::EngineError;

pub type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Map an engine error to the status code the client sees.
pub fn error_response(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::SourceFetchTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        EngineError::SourceFetchError(_) | EngineError::Provider(_) => StatusCode::BAD_GATEWAY,
        EngineError::InvalidProject(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {err}");
    }
    (status, err.to_string())
}

/// GET / - Health check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "repo-lens" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(EngineError::SourceFetchTimeout { secs: 1 }).0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            error_response(EngineError::SourceFetchError("x".into())).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_response(EngineError::InvalidProject("..".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(EngineError::EmptyInput).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
