//! Embedding gateway: one injected backend, a query cache and a call timeout.

use std::sync::Arc;
use std::time::Duration;

use ndarray::Array1;
use tracing::{debug, warn};

use repforge_core::{Error, Result};

use crate::cache::QueryCache;
use crate::embedder::{EmbedderBackend, EmbeddingResult, ProviderInfo};

/// Front door to the embedding provider chosen at construction.
pub struct EmbeddingGateway {
    backend: Arc<dyn EmbedderBackend>,
    cache: QueryCache,
    timeout: Duration,
}

impl EmbeddingGateway {
    pub fn new(backend: Arc<dyn EmbedderBackend>, cache: QueryCache, timeout: Duration) -> Self {
        Self {
            backend,
            cache,
            timeout,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn provider_info(&self) -> ProviderInfo {
        self.backend.provider_info()
    }

    /// Embed a query, serving repeats from the cache.
    pub async fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        if !self.backend.is_available() {
            return Err(Error::ProviderUnavailable("no embedding provider configured".into()));
        }
        if let Some(embedding) = self.cache.get(text) {
            return Ok(EmbeddingResult {
                embedding,
                cached: true,
            });
        }

        let embedding = match tokio::time::timeout(self.timeout, self.backend.embed(text)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Embedding call timed out after {:?}", self.timeout);
                return Err(Error::ProviderUnavailable(format!(
                    "embedding timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };
        self.check_dimension(&embedding)?;

        debug!("Embedded query ({} chars)", text.len());
        self.cache.put(text.to_string(), embedding.clone());
        Ok(EmbeddingResult {
            embedding,
            cached: false,
        })
    }

    /// Embed many texts in one provider call. Not cached.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        if !self.backend.is_available() {
            return Err(Error::ProviderUnavailable("no embedding provider configured".into()));
        }
        let embeddings = tokio::time::timeout(self.timeout, self.backend.embed_batch(texts))
            .await
            .map_err(|_| {
                Error::ProviderUnavailable(format!(
                    "batch embedding timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;
        for e in &embeddings {
            self.check_dimension(e)?;
        }
        Ok(embeddings)
    }

    fn check_dimension(&self, embedding: &Array1<f32>) -> Result<()> {
        let expected = self.backend.dimension();
        if embedding.len() != expected {
            return Err(Error::EmbeddingMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}
