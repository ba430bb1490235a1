//! Remote embedding providers.
//!
//! OpenAI takes a list of inputs in one request. Gemini has separate
//! single and batch endpoints.

use async_trait::async_trait;
use ndarray::Array1;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use repforge_core::{Error, Result};

use crate::embedder::{EmbedderBackend, ProviderInfo};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Output dimension of a known OpenAI embedding model.
pub fn openai_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Output dimension of a known Gemini embedding model.
pub fn gemini_dimension(_model: &str) -> usize {
    768
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Http(format!("API error {}: {}", status, body)))
}

// ---------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI `/v1/embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        let dim = openai_dimension(&model);
        Self {
            client,
            api_key,
            model,
            dim,
        }
    }
}

#[async_trait]
impl EmbedderBackend for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| Error::Http("OpenAI returned no embedding".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Embedding {} texts with OpenAI model {}", texts.len(), self.model);

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let mut parsed: OpenAiResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Http(format!("Invalid response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::Http(format!(
                "OpenAI returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed
            .data
            .into_iter()
            .map(|d| Array1::from_vec(d.embedding))
            .collect())
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "openai".into(),
            model: self.model.clone(),
            dimension: self.dim,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------

#[derive(Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiSingleResponse {
    embedding: GeminiValues,
}

#[derive(Deserialize)]
struct GeminiBatchResponse {
    embeddings: Vec<GeminiValues>,
}

/// Google Generative Language `embedContent` / `batchEmbedContents`.
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dim: usize,
}

impl GeminiEmbedder {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        let dim = gemini_dimension(&model);
        Self {
            client,
            api_key,
            model,
            dim,
        }
    }
}

#[async_trait]
impl EmbedderBackend for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        debug!("Embedding with Gemini model {}", self.model);
        let url = format!("{}/{}:embedContent", GEMINI_BASE_URL, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "content": { "parts": [{ "text": text }] } }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed: GeminiSingleResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Http(format!("Invalid response: {}", e)))?;
        Ok(Array1::from_vec(parsed.embedding.values))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model_ref = format!("models/{}", self.model);
        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|t| json!({ "model": model_ref, "content": { "parts": [{ "text": t }] } }))
            .collect();

        let url = format!("{}/{}:batchEmbedContents", GEMINI_BASE_URL, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed: GeminiBatchResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Http(format!("Invalid response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::Http(format!(
                "Gemini returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        Ok(parsed
            .embeddings
            .into_iter()
            .map(|e| Array1::from_vec(e.values))
            .collect())
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "gemini".into(),
            model: self.model.clone(),
            dimension: self.dim,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}
