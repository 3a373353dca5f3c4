//! Shared fixtures for the end-to-end tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use domain_vector_search::{
    CollectionDefinition, CollectionInitializer, ColorSource, Embedding, EmbeddingProvider,
    InMemoryIndex, IndexPoint, InitializationStatusTracker, ItemId, ItemSource, SearchHit, SearchQuery,
    VectorConfig, VectorIndex, VectorSearchError, VectorSearchResult,
};

/// One dimension per ASCII letter
pub const LETTER_DIMENSION: u64 = 26;

/// Deterministic embedder: letter frequencies of the text, or byte buckets of an image
#[derive(Default)]
pub struct LetterEmbedder {
    failing: HashSet<String>,
}

impl LetterEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail for these exact inputs
    pub fn failing_on<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: inputs.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed_text(&self, text: &str) -> VectorSearchResult<Embedding> {
        if self.failing.contains(text) {
            return Err(VectorSearchError::Embedding(format!(
                "model rejected '{}'",
                text
            )));
        }

        let mut values = vec![0.0; LETTER_DIMENSION as usize];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            values[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(Embedding::new(values))
    }

    async fn embed_image(&self, bytes: &[u8], _format: &str) -> VectorSearchResult<Embedding> {
        let mut values = vec![0.0; LETTER_DIMENSION as usize];
        for byte in bytes {
            values[*byte as usize % LETTER_DIMENSION as usize] += 1.0;
        }
        Ok(Embedding::new(values))
    }
}

/// In-memory index whose upserts always fail
#[derive(Default)]
pub struct RejectingUpsertIndex {
    inner: InMemoryIndex,
}

#[async_trait]
impl VectorIndex for RejectingUpsertIndex {
    async fn collection_exists(&self, name: &str) -> VectorSearchResult<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, name: &str, config: VectorConfig) -> VectorSearchResult<()> {
        self.inner.create_collection(name, config).await
    }

    async fn delete_collection(&self, name: &str) -> VectorSearchResult<()> {
        self.inner.delete_collection(name).await
    }

    async fn upsert_points(&self, _name: &str, _points: Vec<IndexPoint>) -> VectorSearchResult<()> {
        Err(VectorSearchError::IndexOperation(
            "write quota exceeded".to_string(),
        ))
    }

    async fn search(&self, name: &str, query: SearchQuery) -> VectorSearchResult<Vec<SearchHit>> {
        self.inner.search(name, query).await
    }
}

pub fn colors_definition() -> CollectionDefinition {
    CollectionDefinition::colors().with_dimension(LETTER_DIMENSION)
}

pub fn colors_initializer(
    colors: ColorSource,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    tracker: &Arc<InitializationStatusTracker>,
) -> CollectionInitializer {
    initializer(colors_definition(), Arc::new(colors), embedder, index, tracker)
}

pub fn initializer(
    definition: CollectionDefinition,
    source: Arc<dyn ItemSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    tracker: &Arc<InitializationStatusTracker>,
) -> CollectionInitializer {
    CollectionInitializer::new(definition, source, embedder, index, Arc::clone(tracker))
}

/// Payload values of `key` across every stored point, ordered by id
pub fn payload_values(index: &InMemoryIndex, collection: &str, key: &str) -> Vec<serde_json::Value> {
    let mut points = index.points(collection);
    points.sort_by_key(|p| match p.id {
        ItemId::Num(n) => n,
        ItemId::Uuid(_) => u64::MAX,
    });
    points
        .into_iter()
        .filter_map(|p| p.payload.get(key).cloned())
        .collect()
}
