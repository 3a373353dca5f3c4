use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;
use utoipa::ToSchema;

use super::AppState;
use crate::models::CollectionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub collections: Vec<CollectionStatus>,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe: ready once every registered collection completed initialization
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "All collections initialized", body = ReadinessResponse),
        (status = 503, description = "Initialization pending or failed", body = ReadinessResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let collections = state.tracker.statuses_for(state.supervisor.collections());
    let ready = state.tracker.ready_for(state.supervisor.collections());
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(ReadinessResponse { ready, collections }))
}

/// Initialization status of every collection
#[utoipa::path(
    get,
    path = "/collections/status",
    tag = "collections",
    responses(
        (status = 200, description = "Status of every collection", body = Vec<CollectionStatus>)
    )
)]
pub async fn list_statuses(State(state): State<AppState>) -> Json<Vec<CollectionStatus>> {
    Json(state.tracker.all())
}

/// Initialization status of one collection; unseen names report `NotStarted`
#[utoipa::path(
    get,
    path = "/collections/{name}/status",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 200, description = "Collection status", body = CollectionStatus)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<CollectionStatus> {
    // Only registered collections get an entry; anything else is answered without storing it
    let status = if state.supervisor.contains(&name) {
        state.tracker.get_status(&name)
    } else {
        state.tracker.peek(&name)
    };
    Json(status)
}

/// Server-sent stream of status changes, starting with the current snapshot
#[utoipa::path(
    get,
    path = "/collections/status/stream",
    tag = "collections",
    responses(
        (status = 200, description = "Stream of `status` events", content_type = "text/event-stream", body = CollectionStatus)
    )
)]
pub async fn stream_statuses(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the snapshot so no transition falls between the two
    let updates = BroadcastStream::new(state.tracker.subscribe()).filter_map(|update| match update {
        Ok(status) => Some(status),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "Status stream subscriber lagged");
            None
        }
    });
    let snapshot = tokio_stream::iter(state.tracker.all());

    let events = snapshot
        .chain(updates)
        .map(|status| Ok(status_event(&status)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn status_event(status: &CollectionStatus) -> Event {
    Event::default()
        .event("status")
        .json_data(status)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
