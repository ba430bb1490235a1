//! Error types for RepForge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Profile or preferences are missing; onboarding must be completed first.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Embedding provider not configured or the call failed.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("No candidates: {0}")]
    NoCandidates(String),

    #[error("No alternative found: {0}")]
    NoAlternativeFound(String),

    /// Query and stored vectors come from different models or dimensions.
    #[error("Embedding mismatch: expected dim={expected}, got dim={actual}")]
    EmbeddingMismatch { expected: usize, actual: usize },

    #[error("Invalid exercise: {0}")]
    InvalidExercise(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error belongs to the embedding path and can be recovered
    /// by falling back to lexical search.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable(_) | Error::EmbeddingMismatch { .. } | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
