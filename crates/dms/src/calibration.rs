//! Per-subject threshold calibration
//!
//! Collects openness samples over a short window at startup and derives the
//! closed-eye threshold as a fraction of the subject's mean ratio.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::DetectionState;
use crate::{DmsConfig, DmsError};

/// Outcome of calibration, fixed for the rest of the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Mean ratio over the window, absent when nothing was collected
    pub baseline_ratio: Option<f64>,

    /// Ratios strictly below this count as closed
    pub threshold: f64,

    /// Number of samples behind the baseline
    pub sample_count: usize,

    /// Whether the threshold lies in the configured plausible range
    pub plausible: bool,
}

impl CalibrationResult {
    /// Result for a window that collected no samples
    pub fn fallback(threshold: f64, plausible_range: (f64, f64)) -> Self {
        Self {
            baseline_ratio: None,
            threshold,
            sample_count: 0,
            plausible: in_range(threshold, plausible_range),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.baseline_ratio.is_none()
    }
}

fn in_range(value: f64, (low, high): (f64, f64)) -> bool {
    value >= low && value <= high
}

/// Collects samples for the calibration window
pub struct Calibrator {
    window: Duration,
    threshold_factor: f64,
    fallback_threshold: f64,
    plausible_range: (f64, f64),
    samples: Vec<f64>,
}

impl Calibrator {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            window: config.calibration_duration(),
            threshold_factor: config.threshold_factor,
            fallback_threshold: config.fallback_threshold,
            plausible_range: config.plausible_threshold_range,
            samples: Vec::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a tick `elapsed` after the start still belongs to the window
    pub fn is_window_open(&self, elapsed: Duration) -> bool {
        elapsed < self.window
    }

    /// Record one tick. Returns whether a sample was taken.
    pub fn observe(&mut self, input: &DetectionState) -> bool {
        match input.sample() {
            Some(sample) => {
                self.samples.push(sample.ratio);
                true
            }
            None => false,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Pull ticks from `source` until the wall-clock window elapses.
    ///
    /// A source returning `None` has no more frames and ends the window
    /// early.
    pub fn calibrate<F>(mut self, mut source: F) -> CalibrationResult
    where
        F: FnMut() -> Option<DetectionState>,
    {
        info!("Calibrating for {:?}", self.window);
        let start = Instant::now();

        while self.is_window_open(start.elapsed()) {
            match source() {
                Some(input) => {
                    self.observe(&input);
                }
                None => {
                    warn!(
                        "Detection source ended after {:?} of calibration",
                        start.elapsed()
                    );
                    break;
                }
            }
        }

        self.finish()
    }

    /// Derive the threshold from everything observed so far
    pub fn finish(self) -> CalibrationResult {
        if self.samples.is_empty() {
            warn!(
                "{}; using fallback threshold {:.3}",
                DmsError::EmptyCalibration,
                self.fallback_threshold
            );
            let result = CalibrationResult::fallback(self.fallback_threshold, self.plausible_range);
            if !result.plausible {
                warn!(
                    "Fallback threshold {:.3} is outside the plausible range {:?}",
                    result.threshold, self.plausible_range
                );
            }
            return result;
        }

        let baseline = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        let threshold = baseline * self.threshold_factor;
        let plausible = in_range(threshold, self.plausible_range);

        info!(
            "Calibration complete. Baseline ratio: {:.3}, Threshold: {:.3} ({} samples)",
            baseline,
            threshold,
            self.samples.len()
        );
        if !plausible {
            warn!(
                "Calibrated threshold {:.3} is outside the plausible range {:?}; using it unchanged",
                threshold, self.plausible_range
            );
        }

        CalibrationResult {
            baseline_ratio: Some(baseline),
            threshold,
            sample_count: self.samples.len(),
            plausible,
        }
    }
}
