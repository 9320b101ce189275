//! Domain records for near-Earth objects and impact scenarios

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DataValidationError, InvalidInputError};
use crate::impact::ImpactEstimate;

/// Coarse public-facing severity label.
///
/// Variants are declared least- to most-severe so the derived `Ord`
/// compares by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// All tiers, most- to least-severe
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Critical,
        RiskTier::High,
        RiskTier::Moderate,
        RiskTier::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = DataValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "moderate" => Ok(RiskTier::Moderate),
            "high" => Ok(RiskTier::High),
            "critical" => Ok(RiskTier::Critical),
            _ => Err(DataValidationError::MalformedField {
                field: "risk_level",
                value: s.to_string(),
            }),
        }
    }
}

/// Estimated diameter range in kilometers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    pub kilometers_min: f64,
    pub kilometers_max: f64,
}

impl EstimatedDiameter {
    pub fn meters_max(&self) -> f64 {
        self.kilometers_max * 1000.0
    }
}

/// One predicted flyby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    pub close_approach_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_approach_date_full: Option<String>,

    /// Epoch milliseconds of the approach
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_date_close_approach: Option<i64>,

    pub miss_distance_km: f64,

    pub relative_velocity_kmh: f64,

    #[serde(default = "default_orbiting_body")]
    pub orbiting_body: String,
}

fn default_orbiting_body() -> String {
    "Earth".to_string()
}

/// A near-Earth object as ingested from the feed, plus its derived tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearEarthObject {
    /// Unique key from the source feed
    pub neo_reference_id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nasa_jpl_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_magnitude_h: Option<f64>,

    pub estimated_diameter: EstimatedDiameter,

    pub is_potentially_hazardous_asteroid: bool,

    #[serde(default)]
    pub is_sentry_object: bool,

    /// Ordered as delivered by the feed; may be empty
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproach>,

    pub risk_level: RiskTier,

    pub last_updated: DateTime<Utc>,
}

impl NearEarthObject {
    /// Closest predicted approach over all flybys, `None` when there are none
    pub fn nearest_miss_distance_km(&self) -> Option<f64> {
        self.close_approach_data
            .iter()
            .map(|a| a.miss_distance_km)
            .fold(None, |acc: Option<f64>, d| {
                Some(acc.map_or(d, |m| m.min(d)))
            })
    }

    /// Relative velocity of the first listed approach
    pub fn primary_velocity_kmh(&self) -> Option<f64> {
        self.close_approach_data
            .first()
            .map(|a| a.relative_velocity_kmh)
    }

    /// Recompute the tier from the physical and orbital fields.
    pub fn assess_risk(&self) -> Result<RiskTier, DataValidationError> {
        crate::risk::RiskClassifier::classify(
            self.estimated_diameter.kilometers_min,
            self.estimated_diameter.kilometers_max,
            self.is_potentially_hazardous_asteroid,
            self.nearest_miss_distance_km(),
        )
    }

    /// Recompute and store the tier. Idempotent.
    pub fn refresh_risk(&mut self) -> Result<RiskTier, DataValidationError> {
        let tier = self.assess_risk()?;
        self.risk_level = tier;
        Ok(tier)
    }
}

/// Ground coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(InvalidInputError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(InvalidInputError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }
}

/// A persisted hypothetical impact for one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactScenario {
    pub id: String,

    /// `neo_reference_id` of the impacting object
    pub asteroid_id: String,

    pub impact_location: GeoLocation,

    pub impact_energy_megatons: f64,

    pub estimated_damage_radius_km: f64,

    pub estimated_casualties: u64,

    pub created_at: DateTime<Utc>,
}

impl ImpactScenario {
    /// Package an estimate into a new scenario record
    pub fn new(asteroid_id: String, estimate: ImpactEstimate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            asteroid_id,
            impact_location: estimate.location,
            impact_energy_megatons: estimate.energy_megatons,
            estimated_damage_radius_km: estimate.damage_radius_km,
            estimated_casualties: estimate.casualties,
            created_at: Utc::now(),
        }
    }
}
