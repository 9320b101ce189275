//! Kinetic-energy impact estimate.
//!
//! A rough public-facing approximation: a spherical body of fixed bulk
//! density, all kinetic energy released at the surface. Not a scientific
//! model.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;
use crate::models::GeoLocation;

/// Assumed bulk density of the impactor
pub const ASSUMED_DENSITY_KG_M3: f64 = 2000.0;

/// TNT equivalence: 1 megaton = 4.184e15 J
pub const JOULES_PER_MEGATON: f64 = 4.184e15;

/// damage radius (km) = DAMAGE_RADIUS_SCALE_KM * megatons ^ DAMAGE_RADIUS_EXPONENT
pub const DAMAGE_RADIUS_SCALE_KM: f64 = 2.0;
pub const DAMAGE_RADIUS_EXPONENT: f64 = 0.33;

/// People per square kilometer inside the damage radius
pub const POPULATION_DENSITY_PER_KM2: f64 = 100.0;

/// Used when an object has no close-approach data (20 km/s)
pub const DEFAULT_VELOCITY_KMH: f64 = 72_000.0;

/// Derived figures for one hypothetical impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub location: GeoLocation,
    pub energy_megatons: f64,
    pub damage_radius_km: f64,
    pub casualties: u64,
}

pub struct ImpactEstimator;

impl ImpactEstimator {
    /// Estimate energy, damage radius and casualties for an impact at `location`.
    ///
    /// All inputs are validated before any arithmetic runs. Inputs that are
    /// valid but so extreme that the energy underflows to zero or overflows
    /// to infinity are rejected rather than returned.
    pub fn estimate(
        max_diameter_m: f64,
        relative_velocity_kmh: f64,
        location: GeoLocation,
    ) -> Result<ImpactEstimate, InvalidInputError> {
        if !max_diameter_m.is_finite() || max_diameter_m <= 0.0 {
            return Err(InvalidInputError::NonPositiveDiameter(max_diameter_m));
        }
        if !relative_velocity_kmh.is_finite() || relative_velocity_kmh <= 0.0 {
            return Err(InvalidInputError::NonPositiveVelocity(relative_velocity_kmh));
        }
        location.validate()?;

        let energy_megatons = impact_energy_megatons(max_diameter_m, relative_velocity_kmh);
        let damage_radius_km = damage_radius_km(energy_megatons);
        if !is_positive_finite(energy_megatons) || !is_positive_finite(damage_radius_km) {
            return Err(InvalidInputError::EstimateOutOfRange {
                energy_megatons,
                damage_radius_km,
            });
        }

        Ok(ImpactEstimate {
            location,
            energy_megatons,
            damage_radius_km,
            casualties: estimated_casualties(damage_radius_km),
        })
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Mass of a sphere of the assumed density
pub fn impactor_mass_kg(diameter_m: f64) -> f64 {
    let radius_m = diameter_m / 2.0;
    let volume_m3 = 4.0 / 3.0 * PI * radius_m.powi(3);
    volume_m3 * ASSUMED_DENSITY_KG_M3
}

pub fn impact_energy_megatons(diameter_m: f64, velocity_kmh: f64) -> f64 {
    let velocity_ms = velocity_kmh / 3.6;
    let joules = 0.5 * impactor_mass_kg(diameter_m) * velocity_ms * velocity_ms;
    joules / JOULES_PER_MEGATON
}

pub fn damage_radius_km(energy_megatons: f64) -> f64 {
    DAMAGE_RADIUS_SCALE_KM * energy_megatons.max(0.0).powf(DAMAGE_RADIUS_EXPONENT)
}

pub fn estimated_casualties(damage_radius_km: f64) -> u64 {
    let area_km2 = PI * damage_radius_km * damage_radius_km;
    // `as` saturates, so absurd radii clamp to u64::MAX instead of wrapping.
    (area_km2 * POPULATION_DENSITY_PER_KM2).floor() as u64
}
