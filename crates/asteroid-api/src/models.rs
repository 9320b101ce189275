//! Request and response bodies for the Asteroid API

use asteroid_common::{GeoLocation, RiskTier};
use serde::{Deserialize, Serialize};

use crate::ingest::IngestReport;

/// Largest page any list endpoint returns; bigger `limit`s are clamped
pub const MAX_LIST_LIMIT: usize = 1000;

fn default_days_ahead() -> i64 {
    7
}

fn default_asteroid_limit() -> usize {
    50
}

fn default_scenario_limit() -> usize {
    20
}

/// Query for `GET /api/asteroids/fetch`
#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    #[serde(default = "default_days_ahead")]
    pub days_ahead: i64,
}

/// Query for `GET /api/asteroids`
#[derive(Debug, Deserialize)]
pub struct AsteroidListQuery {
    pub risk_level: Option<RiskTier>,

    #[serde(default = "default_asteroid_limit")]
    pub limit: usize,
}

impl AsteroidListQuery {
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_LIST_LIMIT)
    }
}

/// Query for `GET /api/impact-scenarios`
#[derive(Debug, Deserialize)]
pub struct ScenarioListQuery {
    #[serde(default = "default_scenario_limit")]
    pub limit: usize,
}

impl ScenarioListQuery {
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_LIST_LIMIT)
    }
}

/// Body of `POST /api/impact-scenario`
#[derive(Debug, Deserialize)]
pub struct ImpactScenarioRequest {
    pub asteroid_neo_id: String,
    pub impact_location: GeoLocation,
}

/// Response from a feed fetch
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub message: String,
    pub total_count: u64,
    pub date_range: String,
    pub report: IngestReport,
}

impl From<IngestReport> for FetchResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: format!("Successfully processed {} asteroids", report.processed),
            total_count: report.element_count,
            date_range: format!("{} to {}", report.start_date, report.end_date),
            report,
        }
    }
}
