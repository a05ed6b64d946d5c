//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use placement::PlacementError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Caller identity missing.
    Unauthorized(String),
    /// Placement or catalog error.
    Placement(PlacementError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Placement(err) => placement_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn placement_error_to_response(err: PlacementError) -> (StatusCode, String) {
    let status = match &err {
        PlacementError::ProductNotFound(_) | PlacementError::OrderNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PlacementError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
        PlacementError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PlacementError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PlacementError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PlacementError::CompensationFailed { .. } | PlacementError::Internal(_) => {
            tracing::error!(error = %err, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        ApiError::Placement(err)
    }
}
