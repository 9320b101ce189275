use thiserror::Error;

/// A near-Earth-object record that is malformed or internally inconsistent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataValidationError {
    #[error("Minimum diameter {min_km} km exceeds maximum diameter {max_km} km")]
    DiameterOrder { min_km: f64, max_km: f64 },

    #[error("Diameter must be a non-negative number, got {0}")]
    InvalidDiameter(f64),

    #[error("Miss distance must be a non-negative number, got {0}")]
    InvalidMissDistance(f64),

    #[error("Relative velocity must be a non-negative number, got {0}")]
    InvalidVelocity(f64),

    #[error("Malformed {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// A user-supplied value that falls outside what the estimator accepts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    #[error("Diameter must be positive, got {0} m")]
    NonPositiveDiameter(f64),

    #[error("Velocity must be positive, got {0} km/h")]
    NonPositiveVelocity(f64),

    #[error("Latitude must be within [-90, 90], got {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be within [-180, 180], got {0}")]
    LongitudeOutOfRange(f64),

    #[error("Asteroid not found: {0}")]
    UnknownObject(String),

    #[error("Feed window must be between 0 and {max} days, got {days}")]
    FeedWindowOutOfRange { days: i64, max: i64 },

    #[error("Impact estimate out of range: {energy_megatons} Mt, {damage_radius_km} km radius")]
    EstimateOutOfRange {
        energy_megatons: f64,
        damage_radius_km: f64,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data validation error: {0}")]
    DataValidation(#[from] DataValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
