use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

// Route path constants - single source of truth for all API paths

pub const CACHE_HEALTH: &str = "/api/cache/health";
pub const CACHE_PING: &str = "/api/cache/ping";
pub const CACHE_ITEM: &str = "/api/cache/{key}";
pub const CACHE_ITEM_TTL: &str = "/api/cache/{key}/ttl/{seconds}";

pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";

/// Build the application router with every endpoint and the Swagger UI.
///
/// The static `health` and `ping` paths take priority over `{key}`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(CACHE_HEALTH, get(handlers::health_handler))
        .route(CACHE_PING, get(handlers::ping_handler))
        .route(
            CACHE_ITEM,
            post(handlers::set_handler)
                .get(handlers::get_handler)
                .delete(handlers::delete_handler),
        )
        .route(CACHE_ITEM_TTL, post(handlers::set_with_ttl_handler))
        .merge(SwaggerUi::new(SWAGGER_UI).url(OPENAPI_JSON, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ConnectionDescriptor, ResolvedTopology};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let topology = ResolvedTopology {
            descriptor: ConnectionDescriptor::Standalone {
                host: "127.0.0.1".to_string(),
                port: 1,
                password: None,
            },
            tls: false,
        };
        create_router(AppState::for_topology(&topology, Duration::from_millis(200)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_static_paths_win_over_key_parameter() {
        let (status, body) = get(test_app(), CACHE_PING).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");

        // Reaches the health handler, not a lookup of the key "health"
        let (status, body) = get(test_app(), CACHE_HEALTH).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("\"status\":\"DOWN\""));
    }

    #[tokio::test]
    async fn test_openapi_document_lists_cache_routes() {
        let (status, body) = get(test_app(), OPENAPI_JSON).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(CACHE_ITEM));
        assert!(body.contains(CACHE_ITEM_TTL));
        assert!(body.contains(CACHE_HEALTH));
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/cache/some-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
