//! Similarity search with lexical fallback.
//!
//! Semantic search embeds the query through the gateway and ranks stored
//! vectors of the same model. Any provider-side failure (no provider,
//! timeout, HTTP error, dimension mismatch, catalog not embedded for the
//! active model) degrades that one call to lexical search.

use std::sync::Arc;

use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, warn};

use repforge_core::{Error, Exercise, Result};
use repforge_infer::EmbeddingGateway;
use repforge_store::{SearchFilters, SimilarityHit, SqliteStore};

/// Threshold used when assembling plan days.
pub const DAY_PLAN_THRESHOLD: f64 = 0.4;

/// Threshold used for muscle recommendations and similar-exercise lookups.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.5;

const STOPWORDS: &[&str] = &[
    "and", "for", "the", "with", "using", "exercise", "exercises", "targeting", "training", "only",
    "that", "from", "into", "build", "improve", "at", "a", "an", "to", "of", "in", "on", "or",
];

/// How a result set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Semantic,
    Lexical,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<SimilarityHit>,
    pub mode: SearchMode,
}

/// A catalog entry with its similarity to some reference.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarExercise {
    pub exercise: Exercise,
    pub similarity: f64,
}

/// Semantic search over the catalog, lexical when the provider fails.
pub struct SimilaritySearch {
    store: Arc<SqliteStore>,
    gateway: Arc<EmbeddingGateway>,
}

impl SimilaritySearch {
    pub fn new(store: Arc<SqliteStore>, gateway: Arc<EmbeddingGateway>) -> Self {
        Self { store, gateway }
    }

    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    /// Model name stored vectors must carry to be compared.
    pub fn active_model(&self) -> String {
        self.gateway.provider_info().model
    }

    /// Embed a query. Errors are provider errors and are meant to be
    /// handed to [`search_with_embedding`](Self::search_with_embedding).
    pub async fn embed_query(&self, text: &str) -> Result<Array1<f32>> {
        Ok(self.gateway.embed(text).await?.embedding)
    }

    pub async fn search(
        &self,
        text: &str,
        threshold: f64,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome> {
        let embedding = self.embed_query(text).await;
        self.search_with_embedding(text, embedding, threshold, limit, filters)
    }

    /// Rank with an already computed (or failed) query embedding.
    pub fn search_with_embedding(
        &self,
        text: &str,
        embedding: Result<Array1<f32>>,
        threshold: f64,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome> {
        let embedding = match embedding {
            Ok(e) => e,
            Err(e) => {
                if self.gateway.is_available() {
                    warn!("Query embedding failed, using lexical search: {}", e);
                } else {
                    debug!("No embedding provider, using lexical search");
                }
                return self.lexical(&query_terms(text), limit, filters);
            }
        };

        match self
            .store
            .vector_search(&embedding, &self.active_model(), threshold, limit, filters)
        {
            Ok(hits) => {
                debug!("Semantic search returned {} hits for {:?}", hits.len(), text);
                Ok(SearchOutcome {
                    hits,
                    mode: SearchMode::Semantic,
                })
            }
            Err(e) if e.is_provider_error() => {
                warn!("Vector search unavailable, using lexical search: {}", e);
                self.lexical(&query_terms(text), limit, filters)
            }
            Err(e) => Err(e),
        }
    }

    /// Neighbours of a catalog entry, reusing its stored vector.
    ///
    /// Without a stored vector for the active model the exercise's name and
    /// primary muscles drive a lexical search instead. The exercise itself
    /// is never returned.
    pub fn search_by_exercise_id(&self, exercise_id: i64, limit: usize) -> Result<SearchOutcome> {
        let exercise = self
            .store
            .get_exercise(exercise_id)?
            .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))?;
        let filters = SearchFilters {
            exclude_ids: vec![exercise_id],
            ..Default::default()
        };

        let model = self.active_model();
        if let Some(vector) = self.store.stored_embedding(exercise_id, &model)? {
            match self
                .store
                .vector_search(&vector, &model, RECOMMENDATION_THRESHOLD, limit, &filters)
            {
                Ok(hits) => {
                    return Ok(SearchOutcome {
                        hits,
                        mode: SearchMode::Semantic,
                    })
                }
                Err(e) if e.is_provider_error() => {
                    warn!("Vector search for exercise {} failed: {}", exercise_id, e)
                }
                Err(e) => return Err(e),
            }
        } else {
            debug!("Exercise {} has no {} vector, using lexical search", exercise_id, model);
        }

        let mut terms = query_terms(&exercise.name);
        terms.extend(exercise.primary_muscles.iter().map(|m| m.to_lowercase()));
        self.lexical(&terms, limit, &filters)
    }

    /// Resolve hits to catalog entries, keeping hit order.
    pub fn resolve(&self, hits: &[SimilarityHit]) -> Result<Vec<SimilarExercise>> {
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        let exercises = self.store.get_exercises(&ids)?;
        Ok(exercises
            .into_iter()
            .filter_map(|exercise| {
                hits.iter().find(|h| h.id == exercise.id).map(|h| SimilarExercise {
                    similarity: h.similarity,
                    exercise,
                })
            })
            .collect())
    }

    fn lexical(&self, terms: &[String], limit: usize, filters: &SearchFilters) -> Result<SearchOutcome> {
        let hits = self.store.lexical_search(terms, limit, filters)?;
        debug!("Lexical search over {:?} returned {} hits", terms, hits.len());
        Ok(SearchOutcome {
            hits,
            mode: SearchMode::Lexical,
        })
    }
}

/// Lower-case query terms with punctuation and filler words removed.
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.len() >= 3 && !STOPWORDS.contains(w))
    {
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}
