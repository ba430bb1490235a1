//! Embedding provider configuration and selection.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_GEMINI_MODEL: &str = "text-embedding-004";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Embedding provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAI,
    Gemini,
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Provider requested by the user. Unrecognised values mean `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ProviderPreference {
    #[default]
    Auto,
    OpenAi,
    Gemini,
}

impl From<String> for ProviderPreference {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl ProviderPreference {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => ProviderPreference::OpenAi,
            "gemini" => ProviderPreference::Gemini,
            "auto" | "" => ProviderPreference::Auto,
            other => {
                warn!("Unknown embedding provider {:?}, using auto selection", other);
                ProviderPreference::Auto
            }
        }
    }
}

/// Embedding configuration read from `embedding-config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub preferred_provider: ProviderPreference,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Upper bound on a single provider call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            preferred_provider: ProviderPreference::Auto,
            openai_api_key: None,
            gemini_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            gemini_model: DEFAULT_GEMINI_MODEL.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl EmbeddingConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: EmbeddingConfig = match std::fs::read_to_string(config_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                EmbeddingConfig::default()
            }),
            Err(_) => EmbeddingConfig::default(),
        };

        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.gemini_api_key.is_none() {
            config.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        }
        if let Ok(p) = std::env::var("REPFORGE_EMBEDDING_PROVIDER") {
            config.preferred_provider = ProviderPreference::parse(&p);
        }
        if let Some(ms) = std::env::var("REPFORGE_EMBEDDING_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_ms = ms;
        }

        config
    }

    fn configured(&self, provider: EmbeddingProvider) -> Option<(EmbeddingProvider, String, String)> {
        let (key, model) = match provider {
            EmbeddingProvider::OpenAI => (&self.openai_api_key, &self.openai_model),
            EmbeddingProvider::Gemini => (&self.gemini_api_key, &self.gemini_model),
        };
        key.as_ref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| (provider, model.clone(), k.clone()))
    }

    /// Resolve which provider, model and key to use.
    ///
    /// An explicit preference wins when its key is configured. Otherwise the
    /// first configured key in the order OpenAI, Gemini.
    pub fn resolve_provider(&self) -> Option<(EmbeddingProvider, String, String)> {
        let preferred = match self.preferred_provider {
            ProviderPreference::Auto => None,
            ProviderPreference::OpenAi => Some(EmbeddingProvider::OpenAI),
            ProviderPreference::Gemini => Some(EmbeddingProvider::Gemini),
        };
        if let Some(provider) = preferred {
            match self.configured(provider) {
                Some(resolved) => return Some(resolved),
                None => debug!("Preferred provider {} has no key", provider),
            }
        }

        self.configured(EmbeddingProvider::OpenAI)
            .or_else(|| self.configured(EmbeddingProvider::Gemini))
    }
}
