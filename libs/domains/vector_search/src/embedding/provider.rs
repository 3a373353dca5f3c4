use async_trait::async_trait;

use crate::error::VectorSearchResult;
use crate::models::Embedding;

/// Trait for embedding generation providers
///
/// Implementations call an external model (Ollama, Azure AI Inference) and return one
/// vector per input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a piece of text
    async fn embed_text(&self, text: &str) -> VectorSearchResult<Embedding>;

    /// Generate an embedding for raw image bytes of the given MIME `format`
    async fn embed_image(&self, bytes: &[u8], format: &str) -> VectorSearchResult<Embedding>;
}
