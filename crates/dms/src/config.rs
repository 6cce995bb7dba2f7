//! DMS configuration

use std::time::Duration;

use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Length of the calibration window (milliseconds)
    pub calibration_duration_ms: u64,

    /// Consecutive closed-eye frames required before alerting
    pub frame_check: u32,

    /// Threshold used when calibration collects no samples
    pub fallback_threshold: f64,

    /// Fraction of the baseline ratio below which eyes count as closed
    pub threshold_factor: f64,

    /// Range a calibrated threshold is expected to fall in.
    /// Thresholds outside it are flagged, never clamped.
    pub plausible_threshold_range: (f64, f64),

    /// Landmark boundary checks
    pub validation: ValidationConfig,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            calibration_duration_ms: 5000,
            frame_check: 20,
            fallback_threshold: 0.25,
            threshold_factor: 0.7,
            plausible_threshold_range: (0.1, 0.4),
            validation: ValidationConfig::default(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (alerts sooner)
    pub fn strict() -> Self {
        Self {
            frame_check: 10,
            threshold_factor: 0.8,
            ..Default::default()
        }
    }

    /// Create lenient config (alerts later)
    pub fn lenient() -> Self {
        Self {
            frame_check: 30,
            threshold_factor: 0.6,
            ..Default::default()
        }
    }

    pub fn calibration_duration(&self) -> Duration {
        Duration::from_millis(self.calibration_duration_ms)
    }

    /// Reject settings the state machine cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.frame_check == 0 {
            return Err(DmsError::Config("frame_check must be at least 1".into()));
        }
        if !(self.threshold_factor > 0.0 && self.threshold_factor.is_finite()) {
            return Err(DmsError::Config(format!(
                "threshold_factor must be positive, got {}",
                self.threshold_factor
            )));
        }
        if !(self.fallback_threshold > 0.0 && self.fallback_threshold.is_finite()) {
            return Err(DmsError::Config(format!(
                "fallback_threshold must be positive, got {}",
                self.fallback_threshold
            )));
        }
        let (low, high) = self.plausible_threshold_range;
        if !(low.is_finite() && high.is_finite() && low <= high) {
            return Err(DmsError::Config(format!(
                "plausible_threshold_range must be finite and ordered, got ({}, {})",
                low, high
            )));
        }
        Ok(())
    }
}
