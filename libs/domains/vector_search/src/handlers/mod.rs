mod search;
mod status;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::models::{CollectionState, CollectionStatus, ItemId, SearchHit};
use crate::service::SearchService;
use crate::status::InitializationStatusTracker;
use crate::supervisor::InitializationSupervisor;

pub use search::{RebuildResponse, SearchRequest, SearchResponse};
pub use status::{HealthResponse, ReadinessResponse};

/// Shared state for every vector search route
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<InitializationStatusTracker>,
    pub supervisor: Arc<InitializationSupervisor>,
    pub services: Arc<BTreeMap<String, Arc<SearchService>>>,
}

impl AppState {
    pub fn new(
        tracker: Arc<InitializationStatusTracker>,
        supervisor: Arc<InitializationSupervisor>,
        services: Vec<Arc<SearchService>>,
    ) -> Self {
        let services = services
            .into_iter()
            .map(|service| (service.collection().to_string(), service))
            .collect();
        Self {
            tracker,
            supervisor,
            services: Arc::new(services),
        }
    }
}

/// OpenAPI documentation for the vector search API
#[derive(OpenApi)]
#[openapi(
    paths(
        status::health,
        status::ready,
        status::list_statuses,
        status::get_status,
        status::stream_statuses,
        search::search_collection,
        search::rebuild_collection,
    ),
    components(
        schemas(
            CollectionState, CollectionStatus, ItemId, SearchHit,
            SearchRequest, SearchResponse, RebuildResponse,
            HealthResponse, ReadinessResponse, ErrorResponse
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "collections", description = "Collection initialization status and rebuilds"),
        (name = "search", description = "Similarity search over initialized collections")
    )
)]
pub struct VectorSearchApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(VectorSearchApiDoc::openapi())
}

/// Create the router for every vector search route
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(status::health))
        .route("/ready", get(status::ready))
        .route("/collections/status", get(status::list_statuses))
        .route("/collections/status/stream", get(status::stream_statuses))
        .route("/collections/{name}/status", get(status::get_status))
        .route("/collections/{name}/search", post(search::search_collection))
        .route("/collections/{name}/rebuild", post(search::rebuild_collection))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
}
