use std::sync::Arc;

use doppelganger::config::{AppConfig, StoreBackend};
use doppelganger::github::GitHubAppClient;
use doppelganger::llm::{EmbedClient, LlmChat, LlmClient};
use doppelganger::state::{AppState, ServiceSettings};
use doppelganger::vector::{MemoryVectorStore, PgVectorStore, VectorStore};
use doppelganger::{db, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let store: Arc<dyn VectorStore> = match &config.store {
        StoreBackend::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(database_url, *max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgVectorStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory vector store; embeddings are lost on restart");
            Arc::new(MemoryVectorStore::new())
        }
    };

    let github = GitHubAppClient::new(&config.github).expect("github app client init failed");
    let embedder = EmbedClient::from_env().expect("embedding client init failed");
    tracing::info!(model = embedder.model(), "embedding client initialized");

    // Pull request feedback is disabled when no chat model is configured.
    let llm: Option<Arc<dyn LlmChat>> = match LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; pull request feedback disabled");
            None
        }
    };

    let state = AppState::new(
        &config.webhook_secret,
        ServiceSettings::from_config(&config),
        Arc::new(github),
        Arc::new(embedder),
        llm,
        store,
    );

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "doppelganger listening");
    axum::serve(listener, app).await.expect("server failed");
}
