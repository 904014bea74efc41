use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use repo_lens::api;
use repo_lens::config::Config;
use repo_lens::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;

    // Sweep idle sessions in the background
    let ttl = config.query.session_ttl_secs;
    if ttl > 0 {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(ttl.clamp(10, 300)));
            loop {
                tick.tick().await;
                sessions.purge_expired(ttl);
            }
        });
    }

    let app = Router::new()
        .route("/", get(api::health))
        .route("/ingest", post(api::ingest::ingest))
        .route("/query", post(api::query::query))
        .route("/impact-analysis", post(api::impact::impact_analysis))
        .route("/generate-architecture", get(api::query::generate_architecture))
        .route("/error-context", post(api::query::error_context))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
