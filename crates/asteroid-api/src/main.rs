//! Asteroid API Service
//!
//! REST API for near-Earth object risk tiers and impact scenarios

use anyhow::{Context, Result};
use asteroid_api::{
    cors_layer, create_router, AppState, Config, Ingestor, MemoryStorage, NasaFeedClient,
    RedisStorage, Storage, StorageBackend,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Window pulled by the background refresher
const REFRESH_DAYS_AHEAD: i64 = 7;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asteroid_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Asteroid API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded");
    info!("  API address: {}", config.api_address());
    info!("  Storage backend: {:?}", config.storage_backend);
    info!("  NeoWs base URL: {}", config.nasa_base_url);
    info!("  Refresh interval: {}s", config.refresh_interval_secs);

    // Initialize storage
    let storage: Arc<dyn Storage> = match config.storage_backend {
        StorageBackend::Redis => {
            info!("  Redis URL: {}", config.redis_url);
            Arc::new(
                RedisStorage::new(&config.redis_url)
                    .await
                    .context("Failed to initialize storage")?,
            )
        }
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };

    let feed = NasaFeedClient::new(
        &config.nasa_base_url,
        &config.nasa_api_key,
        Duration::from_secs(config.feed_timeout_secs),
    )?;
    let ingestor = Arc::new(Ingestor::new(Arc::new(feed), storage.clone()));

    if config.refresh_interval_secs > 0 {
        tokio::spawn(
            ingestor
                .clone()
                .run_refresh_loop(config.refresh_interval_secs, REFRESH_DAYS_AHEAD),
        );
    }

    // Create router
    let state = AppState::new(storage, ingestor);
    let app = create_router(state, cors_layer(&config));

    // Bind and serve
    let addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Asteroid API running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
