use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Custom error type for API endpoints
///
/// Maps store failures and request validation problems to HTTP status codes
/// with a JSON `{"error": ...}` body. A missing key is not an error here;
/// handlers answer it with a bare 404.
#[derive(Debug)]
pub enum ApiError {
    /// A TTL of zero seconds was requested
    InvalidTtl(u64),
    /// Redis operation error
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidTtl(seconds) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid TTL: expected a positive number of seconds, got {}", seconds),
            ),
            ApiError::StoreError(err) => {
                tracing::error!("Redis operation failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Redis error: {}", err),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreError(err)
    }
}
