//! Validation Error Types

use crate::landmark::EyeSide;
use thiserror::Error;

/// Errors during landmark validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Landmark set does not hold the expected number of points
    #[error("Malformed {eye} eye landmark set: expected {expected} points, got {actual}")]
    MalformedLandmarkSet {
        eye: EyeSide,
        expected: usize,
        actual: usize,
    },

    /// A coordinate is NaN or infinite
    #[error("Non-finite coordinate in {eye} eye landmark {index}")]
    NonFiniteCoordinate { eye: EyeSide, index: usize },

    /// A coordinate lies outside the configured frame bounds
    #[error("{eye} eye landmark {index} at ({x}, {y}) is outside [{min}, {max}]")]
    OutOfBounds {
        eye: EyeSide,
        index: usize,
        x: f64,
        y: f64,
        min: f64,
        max: f64,
    },
}
