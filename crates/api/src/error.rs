//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::PlaceOrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order placement was refused or failed.
    PlaceOrder(PlaceOrderError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PlaceOrder(err) => place_order_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Reason strings are part of the HTTP contract; the pre-check failure
/// classes must stay distinguishable to callers.
fn place_order_error_to_response(err: PlaceOrderError) -> (StatusCode, String) {
    match &err {
        PlaceOrderError::Order(validation) => (StatusCode::BAD_REQUEST, validation.to_string()),
        PlaceOrderError::AvailabilityUnavailable(_) => (
            StatusCode::BAD_REQUEST,
            "availability service unavailable".to_string(),
        ),
        PlaceOrderError::ProductNotFound(_) => {
            (StatusCode::BAD_REQUEST, "product not found".to_string())
        }
        PlaceOrderError::InsufficientStock { .. } => {
            (StatusCode::BAD_REQUEST, "insufficient stock".to_string())
        }
        PlaceOrderError::Store(_) | PlaceOrderError::Serialization(_) => {
            tracing::error!(error = %err, "order placement failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<PlaceOrderError> for ApiError {
    fn from(err: PlaceOrderError) -> Self {
        ApiError::PlaceOrder(err)
    }
}
