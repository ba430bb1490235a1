//! Embedding backend trait and the no-op implementation.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OpenAiEmbedder` / `GeminiEmbedder`: remote HTTP providers
//! - `NoopEmbedder`: no provider configured; search falls back to lexical matching

use async_trait::async_trait;
use ndarray::Array1;
use serde::Serialize;

use repforge_core::{Error, Result};

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Identity of the provider that produced a vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    /// Model name. Vectors are only comparable within one model.
    pub model: String,
    pub dimension: usize,
}

/// Trait for embedding backends.
#[async_trait]
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    async fn embed(&self, text: &str) -> Result<Array1<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn provider_info(&self) -> ProviderInfo;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize {
        self.provider_info().dimension
    }

    /// Whether a provider is configured.
    fn is_available(&self) -> bool;
}

/// Placeholder embedder used when no provider is configured.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbedderBackend for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Array1<f32>> {
        Err(Error::ProviderUnavailable("no embedding provider configured".into()))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "none".into(),
            model: "none".into(),
            dimension: self.dim,
        }
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_is_unavailable() {
        let noop = NoopEmbedder::new(768);
        assert!(!noop.is_available());
        assert_eq!(noop.dimension(), 768);
        assert!(matches!(
            noop.embed("push up").await,
            Err(Error::ProviderUnavailable(_))
        ));
        assert!(noop.embed_batch(&["a", "b"]).await.is_err());
    }
}
