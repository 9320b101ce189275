//! NeoWs feed client and wire types
//!
//! The feed reports most measurements as decimal strings, sometimes with
//! thousands separators, and omits nested objects freely. Wire types keep
//! everything optional; conversion into [`NearEarthObject`] is where a
//! record is validated and classified.

use anyhow::{Context, Result};
use async_trait::async_trait;
use asteroid_common::{
    CloseApproach, DataValidationError, EstimatedDiameter, NearEarthObject, RiskTier,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// The feed rejects windows longer than this many days
pub const MAX_FEED_WINDOW_DAYS: i64 = 7;

/// Source of raw near-Earth-object records
#[async_trait]
pub trait NeoFeed: Send + Sync {
    async fn fetch(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<FeedResponse>;
}

/// HTTP client for the NeoWs `/feed` endpoint
pub struct NasaFeedClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NasaFeedClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl NeoFeed for NasaFeedClient {
    async fn fetch(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<FeedResponse> {
        let url = format!("{}/feed", self.base_url);
        let start = start_date.format("%Y-%m-%d").to_string();
        let end = end_date.format("%Y-%m-%d").to_string();

        info!("Fetching NeoWs feed {} to {}", start, end);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to connect to NeoWs feed")?
            .error_for_status()
            .context("NeoWs feed returned an error status")?;

        let feed: FeedResponse = response
            .json()
            .await
            .context("Failed to decode NeoWs feed response")?;

        debug!(
            "NeoWs feed returned {} objects across {} days",
            feed.element_count,
            feed.near_earth_objects.len()
        );

        Ok(feed)
    }
}

/// Body of a `/feed` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub element_count: u64,

    /// Records grouped by calendar date
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<RawNeo>>,
}

impl FeedResponse {
    /// All records, in date order
    pub fn records(self) -> impl Iterator<Item = RawNeo> {
        self.near_earth_objects.into_values().flatten()
    }
}

/// A decimal delivered either as a JSON number or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedNumber {
    Number(f64),
    Text(String),
}

impl FeedNumber {
    fn parse(&self, field: &'static str) -> Result<f64, DataValidationError> {
        match self {
            FeedNumber::Number(n) => Ok(*n),
            FeedNumber::Text(s) => s
                .trim()
                .replace(',', "")
                .parse()
                .map_err(|_| DataValidationError::MalformedField {
                    field,
                    value: s.clone(),
                }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDiameterRange {
    pub estimated_diameter_min: Option<f64>,
    pub estimated_diameter_max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEstimatedDiameter {
    pub kilometers: Option<RawDiameterRange>,
    pub meters: Option<RawDiameterRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRelativeVelocity {
    pub kilometers_per_second: Option<FeedNumber>,
    pub kilometers_per_hour: Option<FeedNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMissDistance {
    pub kilometers: Option<FeedNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCloseApproach {
    pub close_approach_date: Option<String>,
    pub close_approach_date_full: Option<String>,
    pub epoch_date_close_approach: Option<i64>,
    pub relative_velocity: Option<RawRelativeVelocity>,
    pub miss_distance: Option<RawMissDistance>,
    pub orbiting_body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNeo {
    pub id: Option<String>,
    pub neo_reference_id: Option<String>,
    pub name: Option<String>,
    pub nasa_jpl_url: Option<String>,
    pub absolute_magnitude_h: Option<f64>,
    pub estimated_diameter: Option<RawEstimatedDiameter>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default)]
    pub close_approach_data: Option<Vec<RawCloseApproach>>,
    #[serde(default)]
    pub is_sentry_object: bool,
}

impl RawNeo {
    /// Identifier used as the storage key
    pub fn reference_id(&self) -> Option<&str> {
        self.neo_reference_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Validate, convert and classify one feed record.
    pub fn into_near_earth_object(
        self,
        ingested_at: DateTime<Utc>,
    ) -> Result<NearEarthObject, DataValidationError> {
        let neo_reference_id = self
            .reference_id()
            .ok_or(DataValidationError::MissingField("neo_reference_id"))?
            .to_string();

        let estimated_diameter = self.diameter()?;

        let close_approach_data = self
            .close_approach_data
            .unwrap_or_default()
            .into_iter()
            .map(RawCloseApproach::into_close_approach)
            .collect::<Result<Vec<_>, _>>()?;

        let mut neo = NearEarthObject {
            name: self.name.unwrap_or_else(|| neo_reference_id.clone()),
            neo_reference_id,
            nasa_jpl_url: self.nasa_jpl_url,
            absolute_magnitude_h: self.absolute_magnitude_h,
            estimated_diameter,
            is_potentially_hazardous_asteroid: self.is_potentially_hazardous_asteroid,
            is_sentry_object: self.is_sentry_object,
            close_approach_data,
            risk_level: RiskTier::Low,
            last_updated: ingested_at,
        };
        neo.refresh_risk()?;

        Ok(neo)
    }

    fn diameter(&self) -> Result<EstimatedDiameter, DataValidationError> {
        let diameters = self
            .estimated_diameter
            .as_ref()
            .ok_or(DataValidationError::MissingField("estimated_diameter"))?;

        // Prefer kilometers; fall back to meters when only those are present.
        let (range, scale) = match (&diameters.kilometers, &diameters.meters) {
            (Some(km), _) => (km, 1.0),
            (None, Some(m)) => (m, 0.001),
            (None, None) => {
                return Err(DataValidationError::MissingField(
                    "estimated_diameter.kilometers",
                ))
            }
        };

        let min = range
            .estimated_diameter_min
            .ok_or(DataValidationError::MissingField("estimated_diameter_min"))?;
        let max = range
            .estimated_diameter_max
            .ok_or(DataValidationError::MissingField("estimated_diameter_max"))?;

        Ok(EstimatedDiameter {
            kilometers_min: min * scale,
            kilometers_max: max * scale,
        })
    }
}

impl RawCloseApproach {
    fn into_close_approach(self) -> Result<CloseApproach, DataValidationError> {
        let raw_date = self
            .close_approach_date
            .ok_or(DataValidationError::MissingField("close_approach_date"))?;
        let close_approach_date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
            .map_err(|_| DataValidationError::MalformedField {
                field: "close_approach_date",
                value: raw_date.clone(),
            })?;

        let miss_distance_km = self
            .miss_distance
            .as_ref()
            .and_then(|m| m.kilometers.as_ref())
            .ok_or(DataValidationError::MissingField("miss_distance.kilometers"))?
            .parse("miss_distance.kilometers")?;
        if !miss_distance_km.is_finite() || miss_distance_km < 0.0 {
            return Err(DataValidationError::InvalidMissDistance(miss_distance_km));
        }

        let velocity = self
            .relative_velocity
            .ok_or(DataValidationError::MissingField("relative_velocity"))?;
        let relative_velocity_kmh = match (
            velocity.kilometers_per_hour,
            velocity.kilometers_per_second,
        ) {
            (Some(kmh), _) => kmh.parse("relative_velocity.kilometers_per_hour")?,
            (None, Some(kms)) => kms.parse("relative_velocity.kilometers_per_second")? * 3600.0,
            (None, None) => {
                return Err(DataValidationError::MissingField(
                    "relative_velocity.kilometers_per_hour",
                ))
            }
        };
        if !relative_velocity_kmh.is_finite() || relative_velocity_kmh < 0.0 {
            return Err(DataValidationError::InvalidVelocity(relative_velocity_kmh));
        }

        Ok(CloseApproach {
            close_approach_date,
            close_approach_date_full: self.close_approach_date_full,
            epoch_date_close_approach: self.epoch_date_close_approach,
            miss_distance_km,
            relative_velocity_kmh,
            orbiting_body: self.orbiting_body.unwrap_or_else(|| "Earth".to_string()),
        })
    }
}
