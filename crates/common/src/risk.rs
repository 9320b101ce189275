//! Risk tiering for near-Earth objects.
//!
//! Tiers are decided from the maximum estimated diameter, the feed's
//! hazardous flag and the nearest predicted miss distance. Diameter
//! thresholds are inclusive (`>=`), distance thresholds are strict (`<`).

use crate::error::DataValidationError;
use crate::models::RiskTier;

/// One astronomical unit in kilometers.
pub const AU_KM: f64 = 149_597_870.7;

/// Objects at least this wide are "large" regardless of proximity.
pub const LARGE_DIAMETER_KM: f64 = 1.0;

/// Minimum size for a close hazardous pass to be critical.
pub const NOTABLE_DIAMETER_KM: f64 = 0.5;

/// Conventional potentially-hazardous size cutoff (140 m).
pub const HAZARD_DIAMETER_KM: f64 = 0.14;

/// Miss distance under which a notable hazardous object is critical (0.05 AU).
pub const DANGER_MISS_DISTANCE_KM: f64 = 0.05 * AU_KM;

/// Miss distance under which an unflagged hazard-sized object is moderate (0.2 AU).
pub const MODERATE_MISS_DISTANCE_KM: f64 = 0.2 * AU_KM;

pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify one object.
    ///
    /// `nearest_miss_km` is `None` when the feed carried no close-approach
    /// data; an unknown distance never raises the tier.
    pub fn classify(
        diameter_min_km: f64,
        diameter_max_km: f64,
        is_hazardous: bool,
        nearest_miss_km: Option<f64>,
    ) -> Result<RiskTier, DataValidationError> {
        validate_diameter(diameter_min_km)?;
        validate_diameter(diameter_max_km)?;
        if diameter_min_km > diameter_max_km {
            return Err(DataValidationError::DiameterOrder {
                min_km: diameter_min_km,
                max_km: diameter_max_km,
            });
        }
        if let Some(miss) = nearest_miss_km {
            if !miss.is_finite() || miss < 0.0 {
                return Err(DataValidationError::InvalidMissDistance(miss));
            }
        }

        let diameter = diameter_max_km;
        let within = |limit: f64| nearest_miss_km.is_some_and(|miss| miss < limit);

        let tier = if is_hazardous
            && (diameter >= LARGE_DIAMETER_KM
                || (diameter >= NOTABLE_DIAMETER_KM && within(DANGER_MISS_DISTANCE_KM)))
        {
            RiskTier::Critical
        } else if is_hazardous && diameter >= HAZARD_DIAMETER_KM {
            RiskTier::High
        } else if is_hazardous
            || (diameter >= HAZARD_DIAMETER_KM && within(MODERATE_MISS_DISTANCE_KM))
        {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        };

        Ok(tier)
    }
}

fn validate_diameter(km: f64) -> Result<(), DataValidationError> {
    if !km.is_finite() || km < 0.0 {
        return Err(DataValidationError::InvalidDiameter(km));
    }
    Ok(())
}
