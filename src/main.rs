use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod storage;
mod utils;

use api::AppState;
use config::{AppConfig, StoreBackend};
use domain::order::OrderRepository;
use storage::{KeyValueStore, MemoryStore, RedisStore};
use utils::{retry_on_transient, RetryConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orders_api=debug"))
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "🚀 Starting orders API");

    // === 1. Connect to the backing store ===
    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreBackend::Redis => {
            let url = config.redis_url();
            tracing::info!(url = %url, "Connecting to Redis...");
            let redis = retry_on_transient(RetryConfig::startup(), |_attempt| RedisStore::connect(&url))
                .await?;
            Arc::new(redis)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; orders are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    store.ping().await?;

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);

    // === 3. Wire the repository ===
    let mut repo = OrderRepository::new(store.clone()).with_metrics(metrics.clone());
    if let Some(deadline) = config.store_timeout {
        repo = repo.with_deadline(deadline);
    }

    let state = web::Data::new(AppState {
        repo,
        store: store.clone(),
        metrics: metrics.clone(),
        page_size: config.page_size,
    });
    let metrics_data = web::Data::from(metrics);

    // === 4. Serve until SIGINT/SIGTERM ===
    tracing::info!(host = %config.host, port = config.port, store = store.backend_name(), "📡 Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(metrics_data.clone())
            .configure(api::configure)
    })
    .shutdown_timeout(config.shutdown_timeout.as_secs())
    .bind(config.bind_addr())?
    .run()
    .await?;

    tracing::info!("👋 Server stopped");

    Ok(())
}
