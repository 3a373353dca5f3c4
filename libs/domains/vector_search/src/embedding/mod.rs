mod azure_inference;
mod ollama;
mod provider;

pub use azure_inference::{AzureInferenceConfig, AzureInferenceProvider};
pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
