use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::AppState;
use crate::error::{VectorSearchError, VectorSearchResult};
use crate::models::{SearchFilter, SearchHit};

/// Similarity search request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free text embedded with the collection's provider
    pub query: String,
    /// Optional payload filter, e.g. `{"match": {"key": "rand_number", "value": 3}}`
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub filter: Option<SearchFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub collection: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RebuildResponse {
    pub collection: String,
    pub accepted: bool,
}

/// Search a collection by free text
#[utoipa::path(
    post,
    path = "/collections/{name}/search",
    tag = "search",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Hits ordered by descending score", body = SearchResponse),
        (status = 404, description = "Collection not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Embedding or index failure", body = crate::error::ErrorResponse),
        (status = 504, description = "Upstream call timed out", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SearchRequest>,
) -> VectorSearchResult<Json<SearchResponse>> {
    let service = state
        .services
        .get(&name)
        .ok_or_else(|| VectorSearchError::CollectionNotFound(name.clone()))?;

    let hits = match request.filter {
        Some(filter) => service.search_filtered(&request.query, filter).await?,
        None => service.search(&request.query).await?,
    };

    Ok(Json(SearchResponse {
        collection: name,
        hits,
    }))
}

/// Start a background rebuild of a collection
#[utoipa::path(
    post,
    path = "/collections/{name}/rebuild",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 202, description = "Rebuild started", body = RebuildResponse),
        (status = 404, description = "Collection not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Rebuild already in progress", body = crate::error::ErrorResponse)
    )
)]
pub async fn rebuild_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> VectorSearchResult<impl IntoResponse> {
    // Outcome lands in the tracker; the handle is not awaited here
    let _handle = state.supervisor.rebuild(&name)?;
    info!(collection = %name, "Rebuild requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(RebuildResponse {
            collection: name,
            accepted: true,
        }),
    ))
}
