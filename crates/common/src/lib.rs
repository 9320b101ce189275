pub mod error;
pub mod impact;
pub mod models;
pub mod risk;

pub use error::{DataValidationError, Error, InvalidInputError, Result};
pub use impact::{ImpactEstimate, ImpactEstimator};
pub use models::{
    CloseApproach, EstimatedDiameter, GeoLocation, ImpactScenario, NearEarthObject, RiskTier,
};
pub use risk::RiskClassifier;
