//! Asteroid API Service
//!
//! Ingests near-Earth objects from the NeoWs feed, tiers them by risk and
//! creates hypothetical impact scenarios on request.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api` - Service banner
//! - `GET /api/asteroids/fetch?days_ahead=` - Pull the feed window and store it
//! - `GET /api/asteroids?risk_level=&limit=` - List stored asteroids
//! - `GET /api/asteroids/{neo_reference_id}` - Get one asteroid
//! - `POST /api/impact-scenario` - Create an impact scenario
//! - `GET /api/impact-scenarios?limit=` - List impact scenarios
//! - `GET /api/stats` - Dashboard counters

pub mod config;
pub mod feed;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod scenarios;
pub mod storage;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use config::{Config, StorageBackend};
pub use feed::{NasaFeedClient, NeoFeed};
pub use handlers::AppState;
pub use ingest::{IngestReport, Ingestor};
pub use storage::{MemoryStorage, RedisStorage, Storage};

/// Build the CORS layer for the configured origins
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

/// Create the application router
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api", get(handlers::root_handler))
        .route("/api/", get(handlers::root_handler))
        .route("/api/asteroids", get(handlers::list_asteroids_handler))
        .route(
            "/api/asteroids/fetch",
            get(handlers::fetch_asteroids_handler),
        )
        .route(
            "/api/asteroids/{neo_reference_id}",
            get(handlers::get_asteroid_handler),
        )
        .route(
            "/api/impact-scenario",
            post(handlers::create_scenario_handler),
        )
        .route(
            "/api/impact-scenarios",
            get(handlers::list_scenarios_handler),
        )
        .route("/api/stats", get(handlers::stats_handler))
        .with_state(shared_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
