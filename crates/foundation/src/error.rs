use thiserror::Error;

/// Rejected geometry input.
///
/// Coordinates are validated where they enter the system (registry writes,
/// animation start) so NaN never reaches the projection math.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("non-finite coordinate ({lat}, {lng})")]
    NonFiniteCoordinate { lat: f64, lng: f64 },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    NegativeQuantity { field: &'static str, value: f64 },
    #[error("heading {0} is not finite")]
    NonFiniteHeading(f64),
}
