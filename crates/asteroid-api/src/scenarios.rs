//! Impact scenario creation

use asteroid_common::{
    impact::DEFAULT_VELOCITY_KMH, GeoLocation, ImpactEstimator, ImpactScenario,
    InvalidInputError, Result,
};
use tracing::info;

use crate::storage::Storage;

/// Estimate an impact of a stored asteroid at `location` and persist it.
///
/// Nothing is written unless the estimate succeeds.
pub async fn create_scenario(
    storage: &dyn Storage,
    asteroid_neo_id: &str,
    location: GeoLocation,
) -> Result<ImpactScenario> {
    let neo = storage
        .get_asteroid(asteroid_neo_id)
        .await?
        .ok_or_else(|| InvalidInputError::UnknownObject(asteroid_neo_id.to_string()))?;

    let velocity_kmh = neo.primary_velocity_kmh().unwrap_or(DEFAULT_VELOCITY_KMH);
    let estimate = ImpactEstimator::estimate(
        neo.estimated_diameter.meters_max(),
        velocity_kmh,
        location,
    )?;

    let scenario = ImpactScenario::new(neo.neo_reference_id, estimate);
    storage.put_scenario(&scenario).await?;

    info!(
        "Created impact scenario {} for {}: {:.2} Mt, {:.2} km radius, {} casualties",
        scenario.id,
        scenario.asteroid_id,
        scenario.impact_energy_megatons,
        scenario.estimated_damage_radius_km,
        scenario.estimated_casualties
    );

    Ok(scenario)
}
