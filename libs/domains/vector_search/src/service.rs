use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::deadline::with_deadline;
use crate::embedding::EmbeddingProvider;
use crate::error::VectorSearchResult;
use crate::models::{CollectionDefinition, SearchFilter, SearchHit, SearchQuery};
use crate::repository::VectorIndex;

/// Similarity search over one collection
///
/// Embeds the query text with the collection's provider and asks the index for the
/// closest points, bounded by the collection's fixed result limit.
pub struct SearchService {
    definition: CollectionDefinition,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl SearchService {
    pub fn new(
        definition: CollectionDefinition,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            definition,
            embedder,
            index,
        }
    }

    pub fn collection(&self) -> &str {
        &self.definition.name
    }

    pub async fn search(&self, query: &str) -> VectorSearchResult<Vec<SearchHit>> {
        self.execute(query, None).await
    }

    pub async fn search_filtered(
        &self,
        query: &str,
        filter: SearchFilter,
    ) -> VectorSearchResult<Vec<SearchHit>> {
        self.execute(query, Some(filter)).await
    }

    #[instrument(skip(self, filter), fields(collection = %self.definition.name, filtered = filter.is_some()))]
    async fn execute(
        &self,
        query: &str,
        filter: Option<SearchFilter>,
    ) -> VectorSearchResult<Vec<SearchHit>> {
        let timeout = self.definition.call_timeout;

        let embedding = with_deadline("embed query", timeout, self.embedder.embed_text(query))
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to embed search query"))?;

        let request =
            SearchQuery::new(embedding.values, self.definition.search_limit).with_filter(filter);
        let hits = with_deadline(
            "search collection",
            timeout,
            self.index.search(&self.definition.name, request),
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Search request failed"))?;

        debug!(hits = hits.len(), "Search completed");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::error::VectorSearchError;
    use crate::models::{Embedding, ItemId, Payload};
    use crate::repository::MockVectorIndex;

    fn hit(id: u64, score: f32) -> SearchHit {
        SearchHit {
            id: ItemId::Num(id),
            score,
            payload: Payload::new(),
        }
    }

    fn embedder_returning(values: Vec<f32>) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_text()
            .withf(|text| text == "blue")
            .times(1)
            .returning(move |_| Ok(Embedding::new(values.clone())));
        embedder
    }

    #[tokio::test]
    async fn test_search_passes_vector_and_limit() {
        let mut index = MockVectorIndex::new();
        index
            .expect_search()
            .withf(|name, query| {
                name == "colors"
                    && query.vector == vec![0.1, 0.2]
                    && query.limit == 5
                    && query.filter.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(vec![hit(1, 0.9), hit(2, 0.8)]));

        let service = SearchService::new(
            CollectionDefinition::colors(),
            Arc::new(embedder_returning(vec![0.1, 0.2])),
            Arc::new(index),
        );

        let hits = service.search("blue").await.unwrap();
        assert_eq!(hits, vec![hit(1, 0.9), hit(2, 0.8)]);
    }

    #[tokio::test]
    async fn test_search_filtered_passes_filter_unchanged() {
        let filter = SearchFilter::matches("rand_number", 3i64);
        let expected = filter.clone();

        let mut index = MockVectorIndex::new();
        index
            .expect_search()
            .withf(move |_, query| query.filter.as_ref() == Some(&expected))
            .times(1)
            .returning(|_, _| Ok(vec![hit(3, 0.7)]));

        let service = SearchService::new(
            CollectionDefinition::colors(),
            Arc::new(embedder_returning(vec![0.1])),
            Arc::new(index),
        );

        let hits = service.search_filtered("blue", filter).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_index() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_text()
            .returning(|_| Err(VectorSearchError::Embedding("model offline".to_string())));
        let mut index = MockVectorIndex::new();
        index.expect_search().never();

        let service = SearchService::new(
            CollectionDefinition::colors(),
            Arc::new(embedder),
            Arc::new(index),
        );

        let err = service.search("blue").await.unwrap_err();
        assert!(matches!(err, VectorSearchError::Embedding(_)));

        // The filtered variant shares the same failure handling
        let err = service
            .search_filtered("blue", SearchFilter::matches("rand_number", 3i64))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorSearchError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_index_failure_carries_cause() {
        let mut index = MockVectorIndex::new();
        index
            .expect_search()
            .returning(|_, _| Err(VectorSearchError::IndexOperation("connection refused".to_string())));

        let service = SearchService::new(
            CollectionDefinition::colors(),
            Arc::new(embedder_returning(vec![0.1])),
            Arc::new(index),
        );

        let err = service.search("blue").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
