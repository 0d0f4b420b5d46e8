//! Error-to-response mapping for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragsearch_core::Error as CoreError;
use serde::Serialize;
use utoipa::ToSchema;

/// JSON error body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable error kind
    pub error: &'static str,
    /// Human-readable detail
    pub detail: String,
}

/// Core error wrapped for axum.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            CoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            CoreError::DimensionMismatch { .. } => (StatusCode::BAD_REQUEST, "dimension_mismatch"),
            CoreError::DegenerateVector => (StatusCode::BAD_REQUEST, "degenerate_vector"),
            CoreError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            CoreError::EmbeddingProvider(_) => {
                (StatusCode::BAD_GATEWAY, "embedding_provider_error")
            }
            CoreError::InternalInconsistency(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_inconsistency")
            }
            CoreError::Cancelled => (StatusCode::INTERNAL_SERVER_ERROR, "cancelled"),
        };
        let body = ErrorBody {
            error: kind,
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
