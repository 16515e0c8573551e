mod api_doc;
mod cache;
mod config;
mod credentials;
mod error;
mod handlers;
mod models;
mod routes;
mod state;
mod store;
mod topology;

use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use cache::CacheService;
use config::Config;
use credentials::PlatformEnv;
use state::AppState;
use store::{PoolSettings, StoreClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside local development
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_redis_cache=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("rust-redis-cache starting");

    let config = Config::from_env()?;
    config.log_startup();

    let platform = PlatformEnv::from_env();
    let binding = platform.binding(&config.redis_service_name);
    match binding {
        Some(binding) => tracing::info!("Using Redis service binding '{}'", binding.name),
        None if platform.is_on_platform() => tracing::warn!(
            "No service binding named '{}', using local Redis",
            config.redis_service_name
        ),
        None => tracing::info!("Not running on the platform, using local Redis"),
    }

    let topology = topology::resolve_or_local(binding);
    topology.log_startup();

    let store = StoreClient::build(&topology, &PoolSettings::with_borrow_timeout(config.borrow_timeout))
        .context("Failed to create Redis client")?;

    let state = AppState {
        cache: CacheService::new(store),
        config: Arc::new(config),
    };

    let addr = format!("{}:{}", state.config.service_host, state.config.service_port);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
