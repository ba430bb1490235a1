//! RepForge Infer — embedding gateway, provider selection, query cache.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! The provider is chosen once from `EmbeddingConfig`: OpenAI or Gemini
//! when a key is configured, otherwise `NoopEmbedder`, which makes the
//! engine fall back to lexical search.

pub mod cache;
pub mod config;
pub mod embedder;
pub mod gateway;
pub mod providers;

pub use cache::QueryCache;
pub use config::{EmbeddingConfig, EmbeddingProvider, ProviderPreference};
pub use embedder::{EmbedderBackend, EmbeddingResult, NoopEmbedder, ProviderInfo};
pub use gateway::EmbeddingGateway;
pub use providers::{GeminiEmbedder, OpenAiEmbedder};

use std::sync::Arc;
use std::time::Duration;

/// Dimension reported by the no-op embedder.
pub const NOOP_DIMENSION: usize = 768;

/// Create the embedder selected by the configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Arc<dyn EmbedderBackend> {
    match config.resolve_provider() {
        Some((provider, model, key)) => {
            let client = reqwest::Client::new();
            let embedder: Arc<dyn EmbedderBackend> = match provider {
                EmbeddingProvider::OpenAI => Arc::new(OpenAiEmbedder::new(client, key, model)),
                EmbeddingProvider::Gemini => Arc::new(GeminiEmbedder::new(client, key, model)),
            };
            let info = embedder.provider_info();
            tracing::info!(
                "Using {} embedder (model={}, dim={})",
                provider,
                info.model,
                info.dimension
            );
            embedder
        }
        None => {
            tracing::info!("No embedding provider configured. Using lexical search only.");
            Arc::new(NoopEmbedder::new(NOOP_DIMENSION))
        }
    }
}

/// Create a gateway around the configured embedder.
pub fn create_gateway(config: &EmbeddingConfig, cache: QueryCache) -> EmbeddingGateway {
    EmbeddingGateway::new(
        create_embedder(config),
        cache,
        Duration::from_millis(config.timeout_ms),
    )
}
