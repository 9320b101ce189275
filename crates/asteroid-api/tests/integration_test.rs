//! Integration tests for the Asteroid API
//!
//! Drives the router in-process with in-memory storage and a canned feed.

use anyhow::Result;
use asteroid_api::{
    cors_layer, create_router, feed::FeedResponse, AppState, Config, Ingestor, MemoryStorage,
    NeoFeed, Storage, StorageBackend,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use tower_http::cors::CorsLayer;

struct CannedFeed(Value);

#[async_trait]
impl NeoFeed for CannedFeed {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> Result<FeedResponse> {
        Ok(serde_json::from_value(self.0.clone())?)
    }
}

struct UnreachableFeed;

#[async_trait]
impl NeoFeed for UnreachableFeed {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> Result<FeedResponse> {
        anyhow::bail!("NeoWs feed returned an error status: 429 Too Many Requests")
    }
}

fn feed_body() -> Value {
    json!({
        "element_count": 4,
        "near_earth_objects": {
            "2024-09-10": [
                {
                    "id": "2001036",
                    "name": "1036 Ganymed (A924 UB)",
                    "estimated_diameter": {"kilometers": {"estimated_diameter_min": 37.5, "estimated_diameter_max": 83.9}},
                    "is_potentially_hazardous_asteroid": true,
                    "close_approach_data": [{
                        "close_approach_date": "2024-09-10",
                        "relative_velocity": {"kilometers_per_hour": "52,000.0"},
                        "miss_distance": {"kilometers": "55,000,000"}
                    }]
                },
                {
                    "id": "3542519",
                    "name": "(2010 PK9)",
                    "estimated_diameter": {"kilometers": {"estimated_diameter_min": 0.1, "estimated_diameter_max": 0.5}},
                    "is_potentially_hazardous_asteroid": false,
                    "close_approach_data": [{
                        "close_approach_date": "2024-09-10",
                        "relative_velocity": {"kilometers_per_hour": "20000"},
                        "miss_distance": {"kilometers": "15,000,000"}
                    }]
                }
            ],
            "2024-09-11": [
                {
                    "id": "54088823",
                    "name": "(2020 WG)",
                    "estimated_diameter": {"kilometers": {"estimated_diameter_min": 0.006, "estimated_diameter_max": 0.013}},
                    "is_potentially_hazardous_asteroid": false,
                    "close_approach_data": []
                },
                {
                    "id": "bad-record",
                    "estimated_diameter": {"kilometers": {"estimated_diameter_min": 2.0, "estimated_diameter_max": 1.0}}
                }
            ]
        }
    })
}

fn create_test_app(feed: Arc<dyn NeoFeed>) -> (Router, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let ingestor = Arc::new(Ingestor::new(feed, storage.clone()));
    let state = AppState::new(storage.clone(), ingestor);
    (create_router(state, CorsLayer::permissive()), storage)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::String(
            String::from_utf8_lossy(&body).to_string(),
        ))
    };

    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "asteroid-api");

    let (status, json) = send(&app, get("/api/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "active");
}

#[tokio::test]
async fn test_fetch_then_browse() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(&app, get("/api/asteroids/fetch?days_ahead=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Successfully processed 3 asteroids");
    assert_eq!(json["total_count"], 4);
    assert_eq!(json["report"]["skipped"], 1);

    let (status, json) = send(&app, get("/api/asteroids")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["neo_reference_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2001036", "3542519", "54088823"]);

    let (status, json) = send(&app, get("/api/asteroids?risk_level=critical")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "1036 Ganymed (A924 UB)");

    // 0.5 km, unflagged, within 0.2 AU
    let (status, json) = send(&app, get("/api/asteroids/3542519")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["risk_level"], "moderate");
    assert_eq!(json["estimated_diameter"]["kilometers_max"], 0.5);

    let (status, json) = send(&app, get("/api/asteroids?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = send(&app, get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_asteroids"], 3);
    assert_eq!(json["hazardous_asteroids"], 1);
    assert_eq!(json["critical_risk_count"], 1);
    assert_eq!(json["high_risk_count"], 0);
    assert_eq!(json["moderate_risk_count"], 1);
    assert_eq!(json["low_risk_count"], 1);
    assert_eq!(json["total_scenarios"], 0);
}

#[tokio::test]
async fn test_unknown_asteroid_is_not_found() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(&app, get("/api/asteroids/0000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Asteroid not found: 0000000");
}

#[tokio::test]
async fn test_impact_scenario_lifecycle() {
    let (app, storage) = create_test_app(Arc::new(CannedFeed(feed_body())));
    send(&app, get("/api/asteroids/fetch")).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/impact-scenario",
            json!({
                "asteroid_neo_id": "3542519",
                "impact_location": {"lat": 40.7128, "lng": -74.0060}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["asteroid_id"], "3542519");
    assert_eq!(json["impact_location"]["lat"], 40.7128);
    assert_eq!(json["impact_location"]["lng"], -74.0060);
    assert!(json["impact_energy_megatons"].as_f64().unwrap() > 0.0);
    assert!(json["estimated_damage_radius_km"].as_f64().unwrap() > 0.0);
    assert!(json["estimated_casualties"].as_u64().unwrap() > 0);
    let created_id = json["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, get("/api/impact-scenarios")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], created_id.as_str());

    let (_, json) = send(&app, get("/api/stats")).await;
    assert_eq!(json["total_scenarios"], 1);

    assert_eq!(storage.list_scenarios(20).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_scenarios_are_rejected_without_writes() {
    let (app, storage) = create_test_app(Arc::new(CannedFeed(feed_body())));
    send(&app, get("/api/asteroids/fetch")).await;

    let (status, json) = send(
        &app,
        post_json(
            "/api/impact-scenario",
            json!({
                "asteroid_neo_id": "3542519",
                "impact_location": {"lat": 123.0, "lng": 0.0}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Latitude must be within [-90, 90], got 123");

    let (status, _) = send(
        &app,
        post_json(
            "/api/impact-scenario",
            json!({
                "asteroid_neo_id": "does-not-exist",
                "impact_location": {"lat": 0.0, "lng": 0.0}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(storage.list_scenarios(20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_window_out_of_range() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(&app, get("/api/asteroids/fetch?days_ahead=30")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Feed window must be between 0 and 7 days, got 30");
}

#[tokio::test]
async fn test_feed_outage_is_bad_gateway() {
    let (app, storage) = create_test_app(Arc::new(UnreachableFeed));

    let (status, json) = send(&app, get("/api/asteroids/fetch")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("429"));

    assert_eq!(storage.stats().await.unwrap().total_asteroids, 0);
}

#[tokio::test]
async fn test_unknown_risk_level_is_rejected() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(&app, get("/api/asteroids?risk_level=apocalyptic")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json["error"].as_str().expect("JSON error body");
    assert!(message.starts_with("Failed to deserialize query string"));
    assert!(message.contains("apocalyptic"));
}

#[tokio::test]
async fn test_malformed_queries_return_json_errors() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));

    for uri in [
        "/api/asteroids/fetch?days_ahead=abc",
        "/api/asteroids?limit=-1",
        "/api/impact-scenarios?limit=many",
    ] {
        let (status, json) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(json["error"].is_string(), "{} returned {}", uri, json);
    }
}

#[tokio::test]
async fn test_malformed_scenario_body_returns_json_error() {
    let (app, storage) = create_test_app(Arc::new(CannedFeed(feed_body())));

    let (status, json) = send(
        &app,
        post_json("/api/impact-scenario", json!({"asteroid_neo_id": "3542519"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("impact_location"));

    assert!(storage.list_scenarios(20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_limits_are_capped() {
    let (app, _) = create_test_app(Arc::new(CannedFeed(feed_body())));
    send(&app, get("/api/asteroids/fetch")).await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            post_json(
                "/api/impact-scenario",
                json!({
                    "asteroid_neo_id": "2001036",
                    "impact_location": {"lat": -33.87, "lng": 151.21}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(&app, get("/api/impact-scenarios?limit=18446744073709551615")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, json) = send(&app, get("/api/asteroids?limit=9223372036854775809")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);
}

fn config_with_origins(origins: &[&str]) -> Config {
    Config {
        api_host: "127.0.0.1".to_string(),
        api_port: 8000,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        storage_backend: StorageBackend::Memory,
        nasa_api_key: "DEMO_KEY".to_string(),
        nasa_base_url: "https://api.nasa.gov/neo/rest/v1".to_string(),
        feed_timeout_secs: 30,
        refresh_interval_secs: 0,
        cors_origins: origins.iter().map(|o| o.to_string()).collect(),
    }
}

async fn allowed_origin(app: &Router, origin: &str) -> Option<String> {
    let request = Request::builder()
        .uri("/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_follows_configured_origins() {
    let storage = Arc::new(MemoryStorage::new());
    let ingestor = Arc::new(Ingestor::new(
        Arc::new(CannedFeed(feed_body())),
        storage.clone(),
    ));

    let config = config_with_origins(&["https://neo.example.org"]);
    let app = create_router(
        AppState::new(storage.clone(), ingestor.clone()),
        cors_layer(&config),
    );
    assert_eq!(
        allowed_origin(&app, "https://neo.example.org").await.as_deref(),
        Some("https://neo.example.org")
    );
    assert_eq!(allowed_origin(&app, "https://elsewhere.example").await, None);

    let config = config_with_origins(&["*"]);
    let app = create_router(AppState::new(storage, ingestor), cors_layer(&config));
    assert_eq!(
        allowed_origin(&app, "https://elsewhere.example").await.as_deref(),
        Some("*")
    );
}
