//! API request handlers for the Asteroid API

use asteroid_common::{Error, ImpactScenario, InvalidInputError, NearEarthObject};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    ingest::Ingestor,
    models::{
        AsteroidListQuery, FetchQuery, FetchResponse, ImpactScenarioRequest, ScenarioListQuery,
    },
    scenarios,
    storage::{DashboardStats, Storage},
};

/// Shared application state
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, ingestor: Arc<Ingestor>) -> Self {
        Self { storage, ingestor }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidInput(InvalidInputError::UnknownObject(_)) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::DataValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Feed(_) => StatusCode::BAD_GATEWAY,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        let message = match err {
            Error::InvalidInput(e) => e.to_string(),
            Error::DataValidation(e) => e.to_string(),
            other => other.to_string(),
        };

        ApiError { status, message }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.storage.health_check().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "service": "asteroid-api"
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unhealthy",
                "service": "asteroid-api",
                "error": format!("Storage unavailable: {}", e)
            })),
        )
            .into_response(),
    }
}

/// API banner
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Asteroid Risk Visualization API",
        "status": "active"
    }))
}

/// Fetch the feed window and store every valid record
pub async fn fetch_asteroids_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Json<FetchResponse>, ApiError> {
    let Query(query) = query?;
    info!("Fetching asteroids {} days ahead", query.days_ahead);

    let report = state.ingestor.ingest(query.days_ahead).await?;

    Ok(Json(report.into()))
}

/// List stored asteroids, optionally filtered by tier
pub async fn list_asteroids_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AsteroidListQuery>, QueryRejection>,
) -> Result<Json<Vec<NearEarthObject>>, ApiError> {
    let Query(query) = query?;
    let limit = query.capped_limit();
    info!(
        "Listing asteroids (risk_level={:?}, limit={})",
        query.risk_level, limit
    );

    let asteroids = state.storage.list_asteroids(query.risk_level, limit).await?;

    Ok(Json(asteroids))
}

/// Get asteroid by NEO reference ID
pub async fn get_asteroid_handler(
    State(state): State<Arc<AppState>>,
    Path(neo_reference_id): Path<String>,
) -> Result<Json<NearEarthObject>, ApiError> {
    info!("Getting asteroid: {}", neo_reference_id);

    match state.storage.get_asteroid(&neo_reference_id).await? {
        Some(neo) => Ok(Json(neo)),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("Asteroid not found: {}", neo_reference_id),
        }),
    }
}

/// Create an impact scenario for a stored asteroid
pub async fn create_scenario_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImpactScenarioRequest>, JsonRejection>,
) -> Result<Json<ImpactScenario>, ApiError> {
    let Json(payload) = payload?;
    info!(
        "Creating impact scenario for asteroid {} at ({}, {})",
        payload.asteroid_neo_id, payload.impact_location.lat, payload.impact_location.lng
    );

    let scenario = scenarios::create_scenario(
        state.storage.as_ref(),
        &payload.asteroid_neo_id,
        payload.impact_location,
    )
    .await?;

    Ok(Json(scenario))
}

/// List impact scenarios in creation order
pub async fn list_scenarios_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ScenarioListQuery>, QueryRejection>,
) -> Result<Json<Vec<ImpactScenario>>, ApiError> {
    let Query(query) = query?;
    let limit = query.capped_limit();
    info!("Listing impact scenarios (limit={})", limit);

    let scenarios = state.storage.list_scenarios(limit).await?;

    Ok(Json(scenarios))
}

/// Dashboard counters
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state.storage.stats().await?;

    Ok(Json(stats))
}
