use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use crate::models::CacheHealthResponse;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "rust-redis-cache API",
        version = "1.0.0",
        description = "A string cache backed by Redis (standalone or sentinel)"
    ),
    paths(
        handlers::health::health_handler,
        handlers::health::ping_handler,
        handlers::cache::set_handler,
        handlers::cache::set_with_ttl_handler,
        handlers::cache::get_handler,
        handlers::cache::delete_handler
    ),
    components(
        schemas(
            CacheHealthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "cache", description = "Cache operations")
    )
)]
pub struct ApiDoc;
