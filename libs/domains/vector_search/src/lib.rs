//! Vector Search Domain Library
//!
//! Builds similarity-search collections from item sources and serves free-text queries over them.
//! Each collection is rebuilt from scratch at startup: the index collection is recreated, every
//! source item is embedded, and the resulting points are upserted in one batch. Progress is
//! published through an in-process status tracker.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐      ┌──────────────────────────────┐
//! │ InitializationSupervisor│ ──▶ │ InitializationStatusTracker  │
//! └───────────┬────────────┘      └──────────────────────────────┘
//!             │                                  ▲
//! ┌───────────▼────────────┐                     │
//! │  CollectionInitializer │ ────────────────────┘
//! └──┬──────────┬──────────┘
//!    │          │            ┌───────────────┐
//!    │          └──────────▶ │ SearchService │
//!    ▼                       └──┬─────────┬──┘
//! ┌──────────┐  ┌────────────────▼─┐  ┌────▼────────┐
//! │ItemSource│  │ EmbeddingProvider│  │ VectorIndex │
//! └──────────┘  │ Ollama / Azure AI│  │ Qdrant / mem│
//!               └──────────────────┘  └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_vector_search::{
//!     CollectionDefinition, CollectionInitializer, ColorSource, InMemoryIndex,
//!     InitializationStatusTracker, OllamaProvider, SearchService,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = Arc::new(InitializationStatusTracker::new());
//! let index = Arc::new(InMemoryIndex::new());
//! let embedder = Arc::new(OllamaProvider::from_env()?);
//!
//! let initializer = CollectionInitializer::new(
//!     CollectionDefinition::colors(),
//!     Arc::new(ColorSource::new()),
//!     embedder.clone(),
//!     index.clone(),
//!     tracker.clone(),
//! );
//! initializer.initialize().await?;
//!
//! let search = SearchService::new(CollectionDefinition::colors(), embedder, index);
//! let hits = search.search("ocean blue").await?;
//! # Ok(())
//! # }
//! ```

mod deadline;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod initializer;
pub mod memory;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;
pub mod sources;
pub mod status;
pub mod supervisor;

pub use embedding::{
    AzureInferenceConfig, AzureInferenceProvider, EmbeddingProvider, OllamaConfig, OllamaProvider,
};
pub use error::{ErrorResponse, VectorSearchError, VectorSearchResult};
pub use handlers::{
    AppState, RebuildResponse, SearchRequest, SearchResponse, VectorSearchApiDoc, router,
};
pub use initializer::{CollectionInitializer, InitializationReport};
pub use memory::InMemoryIndex;
pub use models::{
    COLORS_COLLECTION, CollectionDefinition, CollectionState, CollectionStatus,
    DEFAULT_CALL_TIMEOUT, DistanceMetric, Embedding, IMAGES_COLLECTION, IdScheme, IndexPoint,
    ItemId, MatchValue, Payload, SearchFilter, SearchHit, SearchQuery, VectorConfig,
};
pub use qdrant::{QdrantConfig, QdrantIndex};
pub use repository::VectorIndex;
pub use service::SearchService;
pub use sources::{
    ColorSource, ImageSourceConfig, ImageStorage, ItemSource, ObjectStoreImageSource, SourceContent,
    SourceItem,
};
pub use status::InitializationStatusTracker;
pub use supervisor::{InitializationHandle, InitializationSupervisor, TaskOutcome};
