use std::path::PathBuf;

/// Errors surfaced by the retrieval and impact engine.
///
/// Index invariant violations and source transport failures propagate to the
/// caller. Provider failures and missing indexes are normally absorbed by the
/// query engine and turned into answer text.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("source fetch timed out after {secs}s")]
    SourceFetchTimeout { secs: u64 },

    #[error("source fetch failed: {0}")]
    SourceFetchError(String),

    #[error("embedding dimension {actual} does not match expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no vectors provided")]
    EmptyInput,

    #[error("{vectors} vectors but {metadata} metadata entries")]
    LengthMismatch { vectors: usize, metadata: usize },

    #[error("index not found for project '{0}'")]
    IndexNotFound(String),

    #[error("provider failure: {0}")]
    Provider(String),

    #[error("invalid project name: {0:?}")]
    InvalidProject(String),

    #[error("invalid chunking: overlap {overlap} must be smaller than chunk size {chunk_size}")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error("corrupt index artifact {}", .0.display())]
    CorruptIndex(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Validate a project name before it is used to build artifact paths.
///
/// An empty name maps to `default`.
pub fn validate_project_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Ok("default".to_string());
    }
    let valid = !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(EngineError::InvalidProject(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_defaults_when_empty() {
        assert_eq!(validate_project_name("  ").unwrap(), "default");
    }

    #[test]
    fn test_project_name_accepts_safe_names() {
        assert_eq!(validate_project_name("my-repo_2.0").unwrap(), "my-repo_2.0");
    }

    #[test]
    fn test_project_name_rejects_traversal() {
        assert!(matches!(
            validate_project_name("../etc"),
            Err(EngineError::InvalidProject(_))
        ));
        assert!(validate_project_name(".hidden").is_err());
        assert!(validate_project_name("a/b").is_err());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = EngineError::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension 3 does not match expected 4"
        );
    }
}
