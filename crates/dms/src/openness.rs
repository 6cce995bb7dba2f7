//! Eye openness ratio from six eye landmarks

use data_validator::{EyeSide, Point2D, ValidationError, EYE_LANDMARK_COUNT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::DmsError;

/// Openness of one eye; higher means more open
pub type OpennessRatio = f64;

/// Six landmarks of one eye.
///
/// Indices 0 and 3 are the horizontal corners, (1, 5) and (2, 4) the
/// vertical pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePoints([Point2D; EYE_LANDMARK_COUNT]);

impl EyePoints {
    pub fn new(points: [Point2D; EYE_LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    /// Build from a collaborator-supplied slice
    pub fn from_slice(eye: EyeSide, points: &[Point2D]) -> Result<Self, ValidationError> {
        <[Point2D; EYE_LANDMARK_COUNT]>::try_from(points)
            .map(Self)
            .map_err(|_| ValidationError::MalformedLandmarkSet {
                eye,
                expected: EYE_LANDMARK_COUNT,
                actual: points.len(),
            })
    }

    pub fn points(&self) -> &[Point2D; EYE_LANDMARK_COUNT] {
        &self.0
    }

    /// All points scaled about the origin
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.map(|p| p.scaled(factor)))
    }
}

/// Maps eye landmarks to openness ratios
pub struct EyeOpennessMeter;

impl EyeOpennessMeter {
    /// Vertical-to-horizontal landmark ratio of one eye.
    ///
    /// Returns `DegenerateLandmarks` instead of an infinite or NaN ratio
    /// when the corner distance is zero.
    pub fn ratio(eye: &EyePoints) -> Result<OpennessRatio, DmsError> {
        let [p0, p1, p2, p3, p4, p5] = eye.points();

        let a = p1.distance(p5);
        let b = p2.distance(p4);
        let c = p0.distance(p3);

        if c == 0.0 {
            return Err(DmsError::DegenerateLandmarks);
        }

        let ratio = (a + b) / (2.0 * c);
        if ratio.is_finite() {
            Ok(ratio)
        } else {
            Err(DmsError::DegenerateLandmarks)
        }
    }

    /// Per-subject sample from both eyes
    pub fn sample(left: &EyePoints, right: &EyePoints) -> Result<Sample, DmsError> {
        Sample::from_eyes(left, right)
    }
}

/// Averaged openness of one subject for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Value compared against the threshold
    pub ratio: OpennessRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<OpennessRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<OpennessRatio>,
}

impl Sample {
    /// Sample with a known ratio and no per-eye detail
    pub fn from_ratio(ratio: OpennessRatio) -> Self {
        Self {
            ratio,
            left: None,
            right: None,
        }
    }

    /// Average of both eyes.
    ///
    /// A degenerate eye is dropped and the other eye stands in for the
    /// subject; only when both are degenerate is the error returned.
    pub fn from_eyes(left: &EyePoints, right: &EyePoints) -> Result<Self, DmsError> {
        let left = EyeOpennessMeter::ratio(left).ok();
        let right = EyeOpennessMeter::ratio(right).ok();

        let ratio = match (left, right) {
            (Some(l), Some(r)) => (l + r) / 2.0,
            (Some(l), None) => {
                debug!("Right eye landmarks degenerate, using left eye only");
                l
            }
            (None, Some(r)) => {
                debug!("Left eye landmarks degenerate, using right eye only");
                r
            }
            (None, None) => return Err(DmsError::DegenerateLandmarks),
        };

        Ok(Self { ratio, left, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Eye with corners 4 apart and both vertical pairs `height` apart
    fn eye(height: f64) -> EyePoints {
        let h = height / 2.0;
        EyePoints::new([
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, h),
            Point2D::new(3.0, h),
            Point2D::new(4.0, 0.0),
            Point2D::new(3.0, -h),
            Point2D::new(1.0, -h),
        ])
    }

    fn collapsed() -> EyePoints {
        EyePoints::new([Point2D::new(2.0, 2.0); EYE_LANDMARK_COUNT])
    }

    #[test]
    fn test_ratio() {
        // (2 + 2) / (2 * 4)
        assert_eq!(EyeOpennessMeter::ratio(&eye(2.0)).unwrap(), 0.5);
        assert_eq!(EyeOpennessMeter::ratio(&eye(0.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_corner_distance() {
        assert_eq!(
            EyeOpennessMeter::ratio(&collapsed()),
            Err(DmsError::DegenerateLandmarks)
        );
    }

    #[test]
    fn test_from_slice() {
        let points = eye(1.0).points().to_vec();
        assert_eq!(EyePoints::from_slice(EyeSide::Left, &points).unwrap(), eye(1.0));

        let err = EyePoints::from_slice(EyeSide::Right, &points[..4]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedLandmarkSet {
                eye: EyeSide::Right,
                expected: 6,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_sample_averages_eyes() {
        let sample = Sample::from_eyes(&eye(2.0), &eye(1.0)).unwrap();
        assert_eq!(sample.ratio, 0.375);
        assert_eq!(sample.left, Some(0.5));
        assert_eq!(sample.right, Some(0.25));
    }

    #[test]
    fn test_sample_with_one_degenerate_eye() {
        let sample = Sample::from_eyes(&collapsed(), &eye(2.0)).unwrap();
        assert_eq!(sample.ratio, 0.5);
        assert_eq!(sample.left, None);

        let sample = EyeOpennessMeter::sample(&eye(1.0), &collapsed()).unwrap();
        assert_eq!(sample.ratio, 0.25);
        assert_eq!(sample.right, None);
    }

    #[test]
    fn test_sample_with_both_eyes_degenerate() {
        assert_eq!(
            Sample::from_eyes(&collapsed(), &collapsed()),
            Err(DmsError::DegenerateLandmarks)
        );
    }

    fn coordinate() -> impl Strategy<Value = f64> {
        -500.0f64..500.0
    }

    proptest! {
        #[test]
        fn prop_ratio_is_scale_invariant(
            coords in prop::array::uniform12(coordinate()),
            factor in 0.01f64..100.0,
        ) {
            let points = [
                Point2D::new(coords[0], coords[1]),
                Point2D::new(coords[2], coords[3]),
                Point2D::new(coords[4], coords[5]),
                Point2D::new(coords[6], coords[7]),
                Point2D::new(coords[8], coords[9]),
                Point2D::new(coords[10], coords[11]),
            ];
            let eye = EyePoints::new(points);
            prop_assume!(points[0].distance(&points[3]) > 1.0);

            let unscaled = EyeOpennessMeter::ratio(&eye).unwrap();
            let scaled = EyeOpennessMeter::ratio(&eye.scaled(factor)).unwrap();
            prop_assert!((unscaled - scaled).abs() <= 1e-9 * unscaled.max(1.0));
        }

        #[test]
        fn prop_ratio_is_non_negative(height in 0.0f64..50.0) {
            prop_assert!(EyeOpennessMeter::ratio(&eye(height)).unwrap() >= 0.0);
        }
    }
}
