use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::CollectionState;

#[derive(Debug, Error)]
pub enum VectorSearchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Index inconsistency: {0}")]
    IndexInconsistency(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index operation failed: {0}")]
    IndexOperation(String),

    #[error("Invalid status transition for '{name}': {state:?} cannot be set explicitly")]
    InvalidStatusTransition { name: String, state: CollectionState },

    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Item source error: {0}")]
    Source(String),

    #[error("'{operation}' timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Rebuild already in progress for '{0}'")]
    RebuildInProgress(String),
}

pub type VectorSearchResult<T> = Result<T, VectorSearchError>;

impl VectorSearchError {
    /// Machine-readable identifier used in HTTP error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::IndexInconsistency(_) => "INDEX_INCONSISTENCY",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::IndexOperation(_) => "INDEX_OPERATION_ERROR",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::Source(_) => "SOURCE_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::CollectionNotFound(_) => "COLLECTION_NOT_FOUND",
            Self::RebuildInProgress(_) => "REBUILD_IN_PROGRESS",
        }
    }

    /// Integer code for logging and monitoring
    pub fn code(&self) -> i32 {
        match self {
            // Client errors (4000-4099)
            Self::CollectionNotFound(_) => 4001,
            Self::RebuildInProgress(_) => 4002,
            Self::InvalidStatusTransition { .. } => 4003,
            // Upstream errors (4100-4199)
            Self::Embedding(_) => 4101,
            Self::IndexOperation(_) => 4102,
            Self::IndexInconsistency(_) => 4103,
            Self::Timeout { .. } => 4104,
            // Internal errors (4200-4299)
            Self::Configuration(_) => 4201,
            Self::ContentNotFound(_) => 4202,
            Self::Source(_) => 4203,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CollectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::RebuildInProgress(_) => StatusCode::CONFLICT,
            Self::InvalidStatusTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Embedding(_) | Self::IndexOperation(_) | Self::IndexInconsistency(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Configuration(_) | Self::ContentNotFound(_) | Self::Source(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<qdrant_client::QdrantError> for VectorSearchError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        VectorSearchError::IndexOperation(err.to_string())
    }
}

impl From<reqwest::Error> for VectorSearchError {
    fn from(err: reqwest::Error) -> Self {
        VectorSearchError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for VectorSearchError {
    fn from(err: serde_json::Error) -> Self {
        VectorSearchError::Embedding(format!("JSON error: {}", err))
    }
}

impl From<object_store::Error> for VectorSearchError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => VectorSearchError::ContentNotFound(path),
            other => VectorSearchError::Source(other.to_string()),
        }
    }
}

impl From<core_config::ConfigError> for VectorSearchError {
    fn from(err: core_config::ConfigError) -> Self {
        VectorSearchError::Configuration(err.to_string())
    }
}

/// JSON error body returned by every handler
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for VectorSearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error_code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(error_code = self.code(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code(),
            error: self.as_str().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
