//! Full-rebuild protocol for one named collection.
//!
//! A run reports `InProgress`, drops any existing collection, recreates it with the
//! collection's fixed vector settings, embeds every source item (skipping items that
//! cannot be resolved or embedded) and upserts the resulting points in one call.
//! The outcome is reported to the status tracker as `Completed` or `Failed`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, instrument, warn};

use crate::deadline::with_deadline;
use crate::embedding::EmbeddingProvider;
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::{CollectionDefinition, CollectionState, Embedding, IndexPoint};
use crate::repository::VectorIndex;
use crate::sources::{ItemSource, SourceContent, SourceItem};
use crate::status::InitializationStatusTracker;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializationReport {
    pub collection: String,
    pub points: usize,
    pub skipped: usize,
}

/// Held for the duration of one run; releases the collection on drop
pub(crate) struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CollectionInitializer {
    definition: CollectionDefinition,
    source: Arc<dyn ItemSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    tracker: Arc<InitializationStatusTracker>,
    running: Arc<AtomicBool>,
}

impl CollectionInitializer {
    pub fn new(
        definition: CollectionDefinition,
        source: Arc<dyn ItemSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        tracker: Arc<InitializationStatusTracker>,
    ) -> Self {
        Self {
            definition,
            source,
            embedder,
            index,
            tracker,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Rebuild the collection from scratch.
    ///
    /// Rejected with `RebuildInProgress` while another run of the same collection is active.
    pub async fn initialize(&self) -> VectorSearchResult<InitializationReport> {
        let guard = self.claim()?;
        self.run(&guard).await
    }

    pub(crate) fn claim(&self) -> VectorSearchResult<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| VectorSearchError::RebuildInProgress(self.definition.name.clone()))?;
        Ok(RunGuard(Arc::clone(&self.running)))
    }

    #[instrument(skip_all, fields(collection = %self.definition.name))]
    pub(crate) async fn run(&self, _guard: &RunGuard) -> VectorSearchResult<InitializationReport> {
        let name = self.definition.name.as_str();
        self.tracker
            .set_status(name, CollectionState::InProgress, None)?;
        info!("Collection initialization started");

        match self.rebuild().await {
            Ok(report) => {
                self.tracker
                    .set_status(name, CollectionState::Completed, None)?;
                info!(
                    points = report.points,
                    skipped = report.skipped,
                    "Collection initialization completed"
                );
                Ok(report)
            }
            Err(err) => {
                error!(error = %err, "Collection initialization failed");
                self.tracker
                    .set_status(name, CollectionState::Failed, Some(err.to_string()))?;
                Err(err)
            }
        }
    }

    async fn rebuild(&self) -> VectorSearchResult<InitializationReport> {
        let name = self.definition.name.as_str();

        self.recreate_collection().await?;

        let items = self
            .call("list source items", self.source.list())
            .await?;

        let mut points: Vec<IndexPoint> = Vec::with_capacity(items.len());
        let mut skipped = 0;
        for item in &items {
            let Some((content, embedding)) = self.embed_item(item).await else {
                skipped += 1;
                continue;
            };

            let position = points.len() as u64 + 1;
            let payload = self.source.payload(item, &content, position);
            points.push(IndexPoint::new(
                self.definition.id_scheme.assign(position),
                embedding.values,
                payload,
            ));
        }

        let report = InitializationReport {
            collection: name.to_string(),
            points: points.len(),
            skipped,
        };
        self.call("upsert points", self.index.upsert_points(name, points))
            .await?;

        Ok(report)
    }

    /// Delete-if-present then create, verifying each step against the index
    async fn recreate_collection(&self) -> VectorSearchResult<()> {
        let name = self.definition.name.as_str();

        if self
            .call("check collection", self.index.collection_exists(name))
            .await?
        {
            self.call("delete collection", self.index.delete_collection(name))
                .await?;
            if self
                .call("check collection", self.index.collection_exists(name))
                .await?
            {
                return Err(VectorSearchError::IndexInconsistency(format!(
                    "'{}' still exists after delete",
                    name
                )));
            }
            info!("Existing collection deleted");
        }

        self.call(
            "create collection",
            self.index.create_collection(name, self.definition.vector),
        )
        .await?;
        if !self
            .call("check collection", self.index.collection_exists(name))
            .await?
        {
            return Err(VectorSearchError::IndexInconsistency(format!(
                "'{}' not found after create",
                name
            )));
        }
        info!(dimension = self.definition.vector.dimension, "Collection created");

        Ok(())
    }

    /// Resolve and embed one item; failures are logged and yield `None`
    async fn embed_item(&self, item: &SourceItem) -> Option<(SourceContent, Embedding)> {
        let content = match self.call("resolve item", self.source.resolve(item)).await {
            Ok(content) => content,
            Err(VectorSearchError::ContentNotFound(path)) => {
                warn!(item = %item.name, path = %path, "Item content not found, skipping");
                return None;
            }
            Err(err) => {
                warn!(item = %item.name, error = %err, "Failed to resolve item, skipping");
                return None;
            }
        };

        let embedding = match &content {
            SourceContent::Text(text) => {
                self.call("embed text", self.embedder.embed_text(text)).await
            }
            SourceContent::Image { bytes, format } => {
                self.call("embed image", self.embedder.embed_image(bytes, format))
                    .await
            }
        };

        match embedding {
            Ok(embedding) if embedding.dimension() as u64 == self.definition.vector.dimension => {
                Some((content, embedding))
            }
            Ok(embedding) => {
                warn!(
                    item = %item.name,
                    dimension = embedding.dimension(),
                    expected = self.definition.vector.dimension,
                    "Embedding has the wrong dimension, skipping"
                );
                None
            }
            Err(err) => {
                warn!(item = %item.name, error = %err, "Failed to embed item, skipping");
                None
            }
        }
    }

    async fn call<T>(
        &self,
        operation: &str,
        call: impl Future<Output = VectorSearchResult<T>>,
    ) -> VectorSearchResult<T> {
        with_deadline(operation, self.definition.call_timeout, call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::memory::InMemoryIndex;
    use crate::models::{ItemId, Payload};
    use crate::repository::MockVectorIndex;
    use crate::sources::{ColorSource, MockItemSource};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const DIM: u64 = 4;

    fn definition() -> CollectionDefinition {
        CollectionDefinition::colors().with_dimension(DIM)
    }

    fn ok_embedder() -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_text()
            .returning(|_| Ok(Embedding::new(vec![0.5; DIM as usize])));
        embedder
    }

    fn initializer(
        index: Arc<dyn VectorIndex>,
        embedder: MockEmbeddingProvider,
        source: Arc<dyn ItemSource>,
    ) -> (CollectionInitializer, Arc<InitializationStatusTracker>) {
        let tracker = Arc::new(InitializationStatusTracker::new());
        let initializer = CollectionInitializer::new(
            definition(),
            source,
            Arc::new(embedder),
            index,
            Arc::clone(&tracker),
        );
        (initializer, tracker)
    }

    #[tokio::test]
    async fn test_protocol_order_when_collection_exists() {
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let exists_calls = Arc::new(AtomicUsize::new(0));
        let mut index = MockVectorIndex::new();

        let calls = Arc::clone(&exists_calls);
        let l = Arc::clone(&log);
        index
            .expect_collection_exists()
            .withf(|name| name == "colors")
            .times(3)
            .returning(move |_| {
                l.lock().unwrap().push("exists");
                // present, gone after delete, present after create
                Ok(calls.fetch_add(1, Ordering::SeqCst) != 1)
            });
        let l = Arc::clone(&log);
        index
            .expect_delete_collection()
            .times(1)
            .returning(move |_| {
                l.lock().unwrap().push("delete");
                Ok(())
            });
        let l = Arc::clone(&log);
        index
            .expect_create_collection()
            .withf(|name, config| name == "colors" && config.dimension == DIM)
            .times(1)
            .returning(move |_, _| {
                l.lock().unwrap().push("create");
                Ok(())
            });
        let l = Arc::clone(&log);
        index
            .expect_upsert_points()
            .withf(|_, points| points.len() == 2)
            .times(1)
            .returning(move |_, _| {
                l.lock().unwrap().push("upsert");
                Ok(())
            });

        let (initializer, tracker) = initializer(
            Arc::new(index),
            ok_embedder(),
            Arc::new(ColorSource::with_colors(["Red", "Blue"])),
        );
        let report = initializer.initialize().await.unwrap();

        assert_eq!(report.points, 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["exists", "delete", "exists", "create", "exists", "upsert"]
        );
        assert_eq!(
            tracker.get_status("colors").state,
            CollectionState::Completed
        );
    }

    #[tokio::test]
    async fn test_failing_create_reports_failed_without_upsert() {
        let mut index = MockVectorIndex::new();
        index.expect_collection_exists().returning(|_| Ok(false));
        index
            .expect_create_collection()
            .times(1)
            .returning(|_, _| Err(VectorSearchError::IndexOperation("disk full".to_string())));
        index.expect_upsert_points().never();

        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_text().never();

        let (initializer, tracker) = initializer(
            Arc::new(index),
            embedder,
            Arc::new(ColorSource::with_colors(["Red"])),
        );
        let err = initializer.initialize().await.unwrap_err();
        assert!(matches!(err, VectorSearchError::IndexOperation(_)));

        let status = tracker.get_status("colors");
        assert_eq!(status.state, CollectionState::Failed);
        assert!(status.error_message.unwrap().contains("disk full"));
        assert!(status.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_collection_surviving_delete_is_inconsistent() {
        let mut index = MockVectorIndex::new();
        index.expect_collection_exists().returning(|_| Ok(true));
        index.expect_delete_collection().times(1).returning(|_| Ok(()));
        index.expect_create_collection().never();

        let (initializer, tracker) = initializer(
            Arc::new(index),
            MockEmbeddingProvider::new(),
            Arc::new(ColorSource::with_colors(["Red"])),
        );
        let err = initializer.initialize().await.unwrap_err();
        assert!(matches!(err, VectorSearchError::IndexInconsistency(_)));
        assert_eq!(tracker.get_status("colors").state, CollectionState::Failed);
    }

    #[tokio::test]
    async fn test_collection_missing_after_create_is_inconsistent() {
        let mut index = MockVectorIndex::new();
        index.expect_collection_exists().returning(|_| Ok(false));
        index.expect_create_collection().times(1).returning(|_, _| Ok(()));
        index.expect_upsert_points().never();

        let (initializer, tracker) = initializer(
            Arc::new(index),
            MockEmbeddingProvider::new(),
            Arc::new(ColorSource::with_colors(["Red"])),
        );
        let err = initializer.initialize().await.unwrap_err();
        assert!(err.to_string().contains("not found after create"));
        assert!(
            tracker
                .get_status("colors")
                .error_message
                .unwrap()
                .contains("not found after create")
        );
    }

    #[tokio::test]
    async fn test_failed_embedding_is_skipped() {
        let index = Arc::new(InMemoryIndex::new());
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_text().times(3).returning(|text| {
            if text == "Green" {
                Err(VectorSearchError::Embedding("model offline".to_string()))
            } else {
                Ok(Embedding::new(vec![0.5; DIM as usize]))
            }
        });

        let (initializer, tracker) = initializer(
            index.clone(),
            embedder,
            Arc::new(ColorSource::with_colors(["Red", "Green", "Blue"])),
        );
        let report = initializer.initialize().await.unwrap();

        assert_eq!(report.points, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(index.ids("colors"), vec![ItemId::Num(1), ItemId::Num(2)]);
        let status = tracker.get_status("colors");
        assert_eq!(status.state, CollectionState::Completed);
        assert!(status.error_message.is_none());
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_skipped() {
        let index = Arc::new(InMemoryIndex::new());
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_text()
            .returning(|_| Ok(Embedding::new(vec![0.5; 3])));

        let (initializer, _) = initializer(
            index.clone(),
            embedder,
            Arc::new(ColorSource::with_colors(["Red"])),
        );
        let report = initializer.initialize().await.unwrap();
        assert_eq!(report.points, 0);
        assert_eq!(index.point_count("colors"), Some(0));
    }

    #[tokio::test]
    async fn test_missing_content_is_skipped() {
        let index = Arc::new(InMemoryIndex::new());
        let mut source = MockItemSource::new();
        source.expect_list().returning(|| {
            Ok(vec![
                SourceItem::new("tiger.jpg"),
                SourceItem::new("elephant.jpeg"),
            ])
        });
        source.expect_resolve().returning(|item| {
            if item.name == "elephant.jpeg" {
                Err(VectorSearchError::ContentNotFound(item.name.clone()))
            } else {
                Ok(SourceContent::Image {
                    bytes: vec![1, 2, 3],
                    format: "image/jpeg".to_string(),
                })
            }
        });
        source.expect_payload().returning(|item, _, _| {
            let mut payload = Payload::new();
            payload.insert("image_name".to_string(), item.name.clone().into());
            payload
        });

        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_image()
            .withf(|bytes, format| bytes == [1, 2, 3] && format == "image/jpeg")
            .times(1)
            .returning(|_, _| Ok(Embedding::new(vec![0.1; DIM as usize])));

        let (initializer, tracker) = initializer(index.clone(), embedder, Arc::new(source));
        let report = initializer.initialize().await.unwrap();

        assert_eq!(report.points, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            index.points("colors")[0].payload["image_name"],
            serde_json::json!("tiger.jpg")
        );
        assert_eq!(tracker.get_status("colors").state, CollectionState::Completed);
    }

    #[tokio::test]
    async fn test_empty_source_completes_with_zero_points() {
        let index = Arc::new(InMemoryIndex::new());
        let (initializer, tracker) = initializer(
            index.clone(),
            MockEmbeddingProvider::new(),
            Arc::new(ColorSource::with_colors(Vec::<String>::new())),
        );

        let report = initializer.initialize().await.unwrap();
        assert_eq!(report.points, 0);
        assert_eq!(index.point_count("colors"), Some(0));
        assert_eq!(tracker.get_status("colors").state, CollectionState::Completed);
    }

    #[tokio::test]
    async fn test_source_listing_failure_is_fatal() {
        let mut source = MockItemSource::new();
        source
            .expect_list()
            .returning(|| Err(VectorSearchError::Source("container missing".to_string())));

        let (initializer, tracker) = initializer(
            Arc::new(InMemoryIndex::new()),
            MockEmbeddingProvider::new(),
            Arc::new(source),
        );
        assert!(initializer.initialize().await.is_err());
        assert!(
            tracker
                .get_status("colors")
                .error_message
                .unwrap()
                .contains("container missing")
        );
    }

    #[tokio::test]
    async fn test_reports_in_progress_before_terminal_state() {
        let (initializer, tracker) = initializer(
            Arc::new(InMemoryIndex::new()),
            ok_embedder(),
            Arc::new(ColorSource::with_colors(["Red"])),
        );
        let mut rx = tracker.subscribe();

        initializer.initialize().await.unwrap();

        assert_eq!(rx.try_recv().unwrap().state, CollectionState::InProgress);
        assert_eq!(rx.try_recv().unwrap().state, CollectionState::Completed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected() {
        let (initializer, tracker) = initializer(
            Arc::new(InMemoryIndex::new()),
            ok_embedder(),
            Arc::new(ColorSource::with_colors(["Red"])),
        );

        let guard = initializer.claim().unwrap();
        assert!(initializer.is_running());
        let err = initializer.initialize().await.unwrap_err();
        assert!(matches!(err, VectorSearchError::RebuildInProgress(ref name) if name == "colors"));
        assert_eq!(tracker.get_status("colors").state, CollectionState::NotStarted);

        drop(guard);
        assert!(!initializer.is_running());
        assert!(initializer.initialize().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_index_times_out_and_fails() {
        struct Hanging;
        #[async_trait::async_trait]
        impl VectorIndex for Hanging {
            async fn collection_exists(&self, _: &str) -> VectorSearchResult<bool> {
                Ok(false)
            }
            async fn create_collection(
                &self,
                _: &str,
                _: crate::models::VectorConfig,
            ) -> VectorSearchResult<()> {
                std::future::pending().await
            }
            async fn delete_collection(&self, _: &str) -> VectorSearchResult<()> {
                Ok(())
            }
            async fn upsert_points(&self, _: &str, _: Vec<IndexPoint>) -> VectorSearchResult<()> {
                Ok(())
            }
            async fn search(
                &self,
                _: &str,
                _: crate::models::SearchQuery,
            ) -> VectorSearchResult<Vec<crate::models::SearchHit>> {
                Ok(vec![])
            }
        }

        let tracker = Arc::new(InitializationStatusTracker::new());
        let initializer = CollectionInitializer::new(
            definition().with_call_timeout(Duration::from_secs(2)),
            Arc::new(ColorSource::with_colors(["Red"])),
            Arc::new(MockEmbeddingProvider::new()),
            Arc::new(Hanging),
            Arc::clone(&tracker),
        );

        let err = initializer.initialize().await.unwrap_err();
        assert!(matches!(err, VectorSearchError::Timeout { ref operation, .. } if operation == "create collection"));
        assert_eq!(tracker.get_status("colors").state, CollectionState::Failed);
    }
}
