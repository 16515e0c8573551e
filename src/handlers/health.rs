use crate::models::CacheHealthResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /api/cache/health handler - Redis connectivity and key count
///
/// Pings Redis and, if it answers, reads the key count of the active database.
/// Returns 200 with status `UP` if Redis answers, 503 with `DOWN` otherwise.
#[utoipa::path(
    get,
    path = routes::CACHE_HEALTH,
    responses(
        (status = 200, description = "Redis is reachable", body = CacheHealthResponse),
        (status = 503, description = "Redis is unreachable", body = CacheHealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CacheHealthResponse>), (StatusCode, Json<CacheHealthResponse>)> {
    let connected = state.cache.is_connected().await;
    // A second borrow would only wait out the same timeout.
    let total_keys = if connected {
        state.cache.approximate_key_count().await
    } else {
        -1
    };

    if connected {
        tracing::debug!("Health check passed ({} keys)", total_keys);
        Ok((
            StatusCode::OK,
            Json(CacheHealthResponse {
                redis_connected: true,
                total_keys,
                status: "UP".to_string(),
            }),
        ))
    } else {
        tracing::error!("Health check failed: Redis is not reachable");
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(CacheHealthResponse {
                redis_connected: false,
                total_keys,
                status: "DOWN".to_string(),
            }),
        ))
    }
}

/// GET /api/cache/ping handler - Liveness of the service itself
#[utoipa::path(
    get,
    path = routes::CACHE_PING,
    responses(
        (status = 200, description = "Service is running", body = String)
    ),
    tag = "health"
)]
pub async fn ping_handler() -> &'static str {
    "pong"
}
