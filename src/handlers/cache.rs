use crate::error::{ApiError, ErrorResponse};
use crate::routes;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /api/cache/{key} handler - Store a value with no expiry
#[utoipa::path(
    post,
    path = routes::CACHE_ITEM,
    params(
        ("key" = String, Path, description = "Cache key")
    ),
    request_body(content = String, description = "Raw value to store", content_type = "text/plain"),
    responses(
        (status = 200, description = "Value stored", body = String),
        (status = 500, description = "Redis error", body = ErrorResponse)
    ),
    tag = "cache"
)]
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    value: String,
) -> Result<(StatusCode, String), ApiError> {
    state.cache.set(&key, &value).await?;

    tracing::info!("Stored value for key: {}", key);
    Ok((StatusCode::OK, format!("Value set for key: {}", key)))
}

/// POST /api/cache/{key}/ttl/{seconds} handler - Store a value that expires
#[utoipa::path(
    post,
    path = routes::CACHE_ITEM_TTL,
    params(
        ("key" = String, Path, description = "Cache key"),
        ("seconds" = u64, Path, description = "Time to live in seconds, at least 1")
    ),
    request_body(content = String, description = "Raw value to store", content_type = "text/plain"),
    responses(
        (status = 200, description = "Value stored with expiry", body = String),
        (status = 400, description = "Invalid TTL", body = ErrorResponse),
        (status = 500, description = "Redis error", body = ErrorResponse)
    ),
    tag = "cache"
)]
pub async fn set_with_ttl_handler(
    State(state): State<AppState>,
    Path((key, seconds)): Path<(String, u64)>,
    value: String,
) -> Result<(StatusCode, String), ApiError> {
    if seconds == 0 {
        return Err(ApiError::InvalidTtl(seconds));
    }

    state.cache.set_with_expiry(&key, &value, seconds).await?;

    tracing::info!("Stored value for key: {} with TTL {}s", key, seconds);
    Ok((
        StatusCode::OK,
        format!("Value set for key: {} with TTL: {}s", key, seconds),
    ))
}

/// GET /api/cache/{key} handler - Retrieve a value
#[utoipa::path(
    get,
    path = routes::CACHE_ITEM,
    params(
        ("key" = String, Path, description = "Cache key")
    ),
    responses(
        (status = 200, description = "Value found", body = String),
        (status = 404, description = "Key not found or expired"),
        (status = 500, description = "Redis error", body = ErrorResponse)
    ),
    tag = "cache"
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    match state.cache.get(&key).await? {
        Some(value) => {
            tracing::info!("Cache hit for key: {}", key);
            Ok((StatusCode::OK, value).into_response())
        }
        None => {
            tracing::info!("Cache miss for key: {}", key);
            Ok(StatusCode::NOT_FOUND.into_response())
        }
    }
}

/// DELETE /api/cache/{key} handler - Remove a key
#[utoipa::path(
    delete,
    path = routes::CACHE_ITEM,
    params(
        ("key" = String, Path, description = "Cache key")
    ),
    responses(
        (status = 200, description = "Whether the key existed", body = String),
        (status = 500, description = "Redis error", body = ErrorResponse)
    ),
    tag = "cache"
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, String), ApiError> {
    let message = if state.cache.delete(&key).await? {
        tracing::info!("Deleted key: {}", key);
        format!("Key deleted: {}", key)
    } else {
        tracing::info!("Delete requested for missing key: {}", key);
        format!("Key not found: {}", key)
    };

    Ok((StatusCode::OK, message))
}
