use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where cloned repos, indexes and metadata are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Language model and embedding provider configuration
    pub llm: LlmConfig,
    /// Ingestion limits and chunking
    pub ingest: IngestConfig,
    /// Retrieval and session settings
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "openai" or "anthropic"
    pub provider: String,
    /// Base URL for the chat API
    pub base_url: String,
    /// Model name for completions
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// "hash", "ollama" or "openai"
    pub embedding_provider: String,
    /// Base URL for the embedding API
    pub embedding_base_url: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key for the embedding provider, if different from `api_key`
    pub embedding_api_key: Option<String>,
    /// Embedding vector dimension, fixed for the whole process
    pub embedding_dim: usize,
    /// Per-call timeout for every provider request
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkMode {
    Chars,
    Lines,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_mode: ChunkMode,
    /// Characters per window
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    pub chunk_overlap: usize,
    /// Lines per chunk in line mode
    pub chunk_lines: usize,
    pub max_file_size_kb: u64,
    /// Global cap on chunks per ingestion
    pub max_chunks: usize,
    pub clone_timeout_secs: u64,
    pub allowed_extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub top_k: usize,
    /// Hard cap on the combined retrieved context
    pub max_context_chars: usize,
    /// Session window size in user/assistant pairs
    pub max_history_pairs: usize,
    /// Idle sessions older than this are expired (0 = never)
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            llm: LlmConfig::default(),
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            api_key: None,
            embedding_provider: "hash".to_string(),
            embedding_base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_api_key: None,
            embedding_dim: 1536,
            timeout_secs: 60,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_mode: ChunkMode::Chars,
            chunk_size: 500,
            chunk_overlap: 100,
            chunk_lines: 40,
            max_file_size_kb: 500,
            max_chunks: 10_000,
            clone_timeout_secs: 300,
            allowed_extensions: [
                "py", "js", "ts", "tsx", "java", "md", "json", "jsx", "go", "rb", "php", "c",
                "cpp", "h", "cs", "swift", "kt", "rs",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_dirs: [
                "node_modules",
                ".git",
                "build",
                "dist",
                "__pycache__",
                "venv",
                ".venv",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_context_chars: 15_000,
            max_history_pairs: 5,
            session_ttl_secs: 3600,
        }
    }
}

/// Overwrite `slot` with the parsed value of `key` when it is set and valid.
fn env_parse<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!("Ignoring invalid value for {key}: {val}"),
        }
    }
}

fn env_string(key: &str, slot: &mut String) {
    if let Ok(val) = std::env::var(key) {
        *slot = val;
    }
}

/// Hosted APIs have a fixed endpoint unless overridden.
fn hosted_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com"),
        "anthropic" => Some("https://api.anthropic.com"),
        _ => None,
    }
}

impl LlmConfig {
    /// Point hosted providers at their public endpoints. Explicit base URLs
    /// are applied afterwards and win.
    fn apply_hosted_defaults(&mut self) {
        if let Some(url) = hosted_base_url(&self.provider) {
            self.base_url = url.to_string();
        }
        if let Some(url) = hosted_base_url(&self.embedding_provider) {
            self.embedding_base_url = url.to_string();
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("REPO_LENS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        env_string("REPO_LENS_BIND_ADDR", &mut config.bind_addr);

        env_string("LLM_PROVIDER", &mut config.llm.provider);
        env_string("EMBEDDING_PROVIDER", &mut config.llm.embedding_provider);
        config.llm.apply_hosted_defaults();

        env_string("LLM_BASE_URL", &mut config.llm.base_url);
        env_string("LLM_CHAT_MODEL", &mut config.llm.chat_model);
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        env_parse("LLM_TIMEOUT_SECS", &mut config.llm.timeout_secs);
        env_string("EMBEDDING_BASE_URL", &mut config.llm.embedding_base_url);
        env_string("EMBEDDING_MODEL", &mut config.llm.embedding_model);
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.llm.embedding_api_key = Some(key);
        }
        env_parse("EMBEDDING_DIM", &mut config.llm.embedding_dim);

        if let Ok(mode) = std::env::var("CHUNK_MODE") {
            config.ingest.chunk_mode = match mode.to_lowercase().as_str() {
                "lines" => ChunkMode::Lines,
                _ => ChunkMode::Chars,
            };
        }
        env_parse("CHUNK_SIZE", &mut config.ingest.chunk_size);
        env_parse("CHUNK_OVERLAP", &mut config.ingest.chunk_overlap);
        env_parse("CHUNK_LINES", &mut config.ingest.chunk_lines);
        env_parse("MAX_FILE_SIZE_KB", &mut config.ingest.max_file_size_kb);
        env_parse("MAX_CHUNKS", &mut config.ingest.max_chunks);
        env_parse("CLONE_TIMEOUT_SECS", &mut config.ingest.clone_timeout_secs);

        env_parse("TOP_K", &mut config.query.top_k);
        env_parse("MAX_CONTEXT_CHARS", &mut config.query.max_context_chars);
        env_parse("MAX_HISTORY_PAIRS", &mut config.query.max_history_pairs);
        env_parse("SESSION_TTL_SECS", &mut config.query.session_ttl_secs);

        config
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.data_dir.join("metadata")
    }

    pub fn graphs_dir(&self) -> PathBuf {
        self.data_dir.join("graphs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ingestion_limits() {
        let config = Config::default();
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 100);
        assert_eq!(config.ingest.max_chunks, 10_000);
        assert_eq!(config.query.max_context_chars, 15_000);
        assert_eq!(config.query.top_k, 10);
        assert!(config.ingest.allowed_extensions.iter().any(|e| e == "rs"));
        assert!(config.ingest.excluded_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_artifact_dirs_live_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/lens"),
            ..Config::default()
        };
        assert_eq!(config.index_dir(), PathBuf::from("/tmp/lens/indexes"));
        assert_eq!(config.metadata_dir(), PathBuf::from("/tmp/lens/metadata"));
        assert_eq!(config.repos_dir(), PathBuf::from("/tmp/lens/repos"));
        assert_eq!(config.graphs_dir(), PathBuf::from("/tmp/lens/graphs"));
    }

    #[test]
    fn test_hosted_providers_have_default_urls() {
        assert_eq!(hosted_base_url("anthropic"), Some("https://api.anthropic.com"));
        assert_eq!(hosted_base_url("ollama"), None);
    }

    #[test]
    fn test_openai_embeddings_default_to_hosted_endpoint() {
        let mut llm = LlmConfig {
            embedding_provider: "openai".to_string(),
            ..LlmConfig::default()
        };
        llm.apply_hosted_defaults();
        assert_eq!(llm.embedding_base_url, "https://api.openai.com");
        // chat stays on the local default
        assert_eq!(llm.base_url, "http://localhost:11434");
    }
}
