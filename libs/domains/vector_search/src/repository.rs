use async_trait::async_trait;

use crate::error::VectorSearchResult;
use crate::models::{IndexPoint, SearchHit, SearchQuery, VectorConfig};

/// Operations the rebuild protocol and search need from a vector index
///
/// Implemented by `QdrantIndex` and by the in-process `InMemoryIndex`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn collection_exists(&self, name: &str) -> VectorSearchResult<bool>;

    async fn create_collection(&self, name: &str, config: VectorConfig) -> VectorSearchResult<()>;

    async fn delete_collection(&self, name: &str) -> VectorSearchResult<()>;

    /// Insert or replace points in one call
    async fn upsert_points(&self, name: &str, points: Vec<IndexPoint>) -> VectorSearchResult<()>;

    /// Nearest neighbours, highest score first, at most `query.limit` hits
    async fn search(&self, name: &str, query: SearchQuery) -> VectorSearchResult<Vec<SearchHit>>;
}
