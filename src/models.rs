use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single retrievable slice of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    /// Path relative to the project root, `/`-separated.
    pub file_path: String,
    /// Character offset of the first character (inclusive).
    pub start_offset: usize,
    /// Character offset one past the last character.
    pub end_offset: usize,
    /// 1-based first line covered.
    pub start_line: usize,
    /// 1-based last line covered.
    pub end_line: usize,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat turn (user or assistant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub project: String,
    pub message: String,
    pub chunk_count: usize,
    pub file_count: usize,
    pub skipped_files: usize,
    /// True when the global chunk cap stopped the walk early.
    pub truncated: bool,
    /// Biggest ingested files, largest first
    pub largest_files: Vec<String>,
    pub indexed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Fixed step function shared with previously persisted results.
    pub fn from_score(score: usize) -> Self {
        match score {
            0 => RiskLevel::None,
            1..=2 => RiskLevel::Low,
            3..=5 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub target_file: String,
    pub direct: Vec<String>,
    pub indirect: Vec<String>,
    pub score: usize,
    pub risk: RiskLevel,
}

/// Ingest request
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    /// Git URL or local directory
    pub repo_url: String,
    #[serde(default)]
    pub project_name: String,
}

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub project_name: String,
    pub session_id: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Impact-analysis request
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactRequest {
    pub file_path: String,
    #[serde(default)]
    pub project_name: String,
}

/// Impact response, field names kept compatible with existing dashboards
#[derive(Debug, Clone, Serialize)]
pub struct ImpactResponse {
    pub target_file: String,
    pub direct_dependencies: Vec<String>,
    pub indirect_dependencies: Vec<String>,
    pub impact_score: usize,
    pub risk_level: RiskLevel,
}

impl From<ImpactResult> for ImpactResponse {
    fn from(result: ImpactResult) -> Self {
        Self {
            target_file: result.target_file,
            direct_dependencies: result.direct,
            indirect_dependencies: result.indirect,
            impact_score: result.score,
            risk_level: result.risk,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorContextRequest {
    #[serde(default)]
    pub project_name: String,
    pub error_text: String,
}

/// A file/line reference pulled out of a traceback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub file_path: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContextResponse {
    pub references: Vec<FileReference>,
    pub chunks: Vec<Chunk>,
    /// Set when chunk retrieval failed and only the frames are returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::None);
        assert_eq!(RiskLevel::from_score(1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::High);
    }

    #[test]
    fn test_risk_serializes_lowercase() {
        let json = serde_json::to_value(RiskLevel::Medium).unwrap();
        assert_eq!(json, "medium");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_impact_response_uses_dashboard_field_names() {
        let response = ImpactResponse::from(ImpactResult {
            target_file: "a.py".into(),
            direct: vec!["b.py".into()],
            indirect: vec![],
            score: 1,
            risk: RiskLevel::Low,
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["impact_score"], 1);
        assert_eq!(json["risk_level"], "low");
        assert_eq!(json["direct_dependencies"][0], "b.py");
    }
}
