//! Azure AI Inference embedding provider
//!
//! Talks to a serverless model deployment (Cohere embed v3 by default) through the
//! Azure AI model inference REST API:
//! - `POST {endpoint}/embeddings` for text
//! - `POST {endpoint}/images/embeddings` for images sent as base64 data URIs

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::Embedding;

const API_VERSION: &str = "2024-05-01-preview";

/// Azure AI Inference provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AzureInferenceConfig {
    /// Deployment endpoint, e.g. `https://my-model.eastus.models.ai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl AzureInferenceConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: "Cohere-embed-v3-english".to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.endpoint.trim_end_matches('/'),
            route,
            API_VERSION
        )
    }
}

impl FromEnv for AzureInferenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_required("AZURE_AI_INFERENCE_ENDPOINT")?;
        let api_key = env_required("AZURE_AI_INFERENCE_KEY")?;
        let model = env_or_default("AZURE_AI_INFERENCE_MODEL", "Cohere-embed-v3-english");

        Ok(Self {
            endpoint,
            api_key,
            model,
        })
    }
}

/// Text and image embeddings from an Azure AI Inference deployment
pub struct AzureInferenceProvider {
    client: Client,
    config: AzureInferenceConfig,
}

impl AzureInferenceProvider {
    pub fn new(config: AzureInferenceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> VectorSearchResult<Self> {
        Ok(Self::new(AzureInferenceConfig::from_env()?))
    }

    async fn post<T: Serialize>(&self, route: &str, request: &T) -> VectorSearchResult<Embedding> {
        let response = self
            .client
            .post(self.config.url(route))
            .header("api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorSearchError::Embedding(format!(
                "Azure AI Inference API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbeddingsResponse = response.json().await?;
        tracing::debug!(model = %self.config.model, items = body.data.len(), "Embedding response received");

        // One input always yields exactly one embedding
        let mut data = body.data;
        if data.len() != 1 {
            return Err(VectorSearchError::Embedding(format!(
                "Expected exactly one embedding, got {}",
                data.len()
            )));
        }
        let item = data.remove(0);
        Ok(Embedding::new(item.embedding))
    }
}

#[derive(Debug, Serialize)]
struct TextEmbeddingsRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageEmbeddingsRequest<'a> {
    input: Vec<ImageInput>,
    input_type: &'static str,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageInput {
    image: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// `data:{format};base64,{payload}` URI accepted by the image embeddings route
fn data_uri(bytes: &[u8], format: &str) -> String {
    format!("data:{};base64,{}", format, STANDARD.encode(bytes))
}

#[async_trait]
impl EmbeddingProvider for AzureInferenceProvider {
    async fn embed_text(&self, text: &str) -> VectorSearchResult<Embedding> {
        let request = TextEmbeddingsRequest {
            input: vec![text],
            model: &self.config.model,
        };
        self.post("embeddings", &request).await
    }

    async fn embed_image(&self, bytes: &[u8], format: &str) -> VectorSearchResult<Embedding> {
        let request = ImageEmbeddingsRequest {
            input: vec![ImageInput {
                image: data_uri(bytes, format),
            }],
            input_type: "document",
            model: &self.config.model,
        };
        self.post("images/embeddings", &request).await
    }
}
