//! Landmark Validator for Count and Range Checking

use crate::error::ValidationError;
use crate::landmark::{EyeSide, Point2D, EYE_LANDMARK_COUNT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Number of points expected per eye
    pub points_per_eye: usize,
    /// Optional valid coordinate range applied to both axes
    pub coordinate_range: Option<(f64, f64)>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            points_per_eye: EYE_LANDMARK_COUNT,
            coordinate_range: None,
        }
    }
}

/// Validator for eye landmark sets
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate one eye's landmark set.
    ///
    /// Checks the point count first, then every coordinate.
    pub fn validate_eye(&self, eye: EyeSide, points: &[Point2D]) -> Result<(), ValidationError> {
        if points.len() != self.config.points_per_eye {
            debug!(
                "Rejecting {} eye: {} points instead of {}",
                eye,
                points.len(),
                self.config.points_per_eye
            );
            return Err(ValidationError::MalformedLandmarkSet {
                eye,
                expected: self.config.points_per_eye,
                actual: points.len(),
            });
        }

        for (index, point) in points.iter().enumerate() {
            if !point.is_finite() {
                return Err(ValidationError::NonFiniteCoordinate { eye, index });
            }
            if let Some((min, max)) = self.config.coordinate_range {
                if point.x < min || point.x > max || point.y < min || point.y > max {
                    return Err(ValidationError::OutOfBounds {
                        eye,
                        index,
                        x: point.x,
                        y: point.y,
                        min,
                        max,
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate both eyes of one subject
    pub fn validate_subject(
        &self,
        left: &[Point2D],
        right: &[Point2D],
    ) -> Result<(), ValidationError> {
        self.validate_eye(EyeSide::Left, left)?;
        self.validate_eye(EyeSide::Right, right)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
