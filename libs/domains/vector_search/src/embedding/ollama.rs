use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::Embedding;

/// Ollama embedding provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: "mxbai-embed-large".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl FromEnv for OllamaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or_default("OLLAMA_BASE_URL", "http://localhost:11434");
        let model = env_or_default("OLLAMA_EMBED_MODEL", "mxbai-embed-large");

        Ok(Self { base_url, model })
    }
}

/// Text embeddings served by a local Ollama instance
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> VectorSearchResult<Self> {
        Ok(Self::new(OllamaConfig::from_env()?))
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed_text(&self, text: &str) -> VectorSearchResult<Embedding> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: vec![text],
        };

        let response = self
            .client
            .post(format!(
                "{}/api/embed",
                self.config.base_url.trim_end_matches('/')
            ))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorSearchError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response.json().await?;
        body.embeddings
            .into_iter()
            .next()
            .filter(|values| !values.is_empty())
            .map(Embedding::new)
            .ok_or_else(|| VectorSearchError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_image(&self, _bytes: &[u8], format: &str) -> VectorSearchResult<Embedding> {
        Err(VectorSearchError::Embedding(format!(
            "Ollama model '{}' does not embed images ({})",
            self.config.model, format
        )))
    }
}
