use std::sync::Arc;
use std::time::Duration;

use crate::chat::{QueryEngine, SessionStore};
use crate::config::Config;
use crate::graph::GraphStore;
use crate::ingest::Ingestor;
use crate::llm::{AnyChatModel, AnyEmbedder};
use crate::search::registry::IndexRegistry;
use crate::search::vector::IndexStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<QueryEngine<AnyEmbedder, AnyChatModel>>,
    pub ingestor: Arc<Ingestor<AnyEmbedder>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(config.repos_dir())?;
        std::fs::create_dir_all(config.index_dir())?;
        std::fs::create_dir_all(config.metadata_dir())?;
        std::fs::create_dir_all(config.graphs_dir())?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let embedder = AnyEmbedder::from_config(&http_client, &config.llm)?;
        let chat_model = AnyChatModel::from_config(&http_client, &config.llm)?;
        tracing::info!(
            "Providers: chat={} embedding={} (dim {})",
            config.llm.provider,
            config.llm.embedding_provider,
            config.llm.embedding_dim
        );

        let registry = Arc::new(IndexRegistry::new(
            IndexStore::new(config.index_dir(), config.metadata_dir()),
            config.llm.embedding_dim,
        ));
        let sessions = Arc::new(SessionStore::new());
        let timeout = Duration::from_secs(config.llm.timeout_secs);

        let engine = QueryEngine::new(
            embedder.clone(),
            chat_model,
            registry.clone(),
            sessions.clone(),
            config.query.clone(),
            timeout,
        );
        let ingestor = Ingestor::new(
            embedder,
            registry,
            GraphStore::new(config.graphs_dir()),
            config.ingest.clone(),
            config.repos_dir(),
            timeout,
        );

        Ok(Self {
            config,
            engine: Arc::new(engine),
            ingestor: Arc::new(ingestor),
            sessions,
        })
    }
}
