//! Driver Monitoring System (DMS)
//!
//! Drowsiness detection from per-frame eye landmarks:
//! - Eye openness ratio from six landmarks per eye
//! - Per-subject threshold calibration at startup
//! - Frame-persistence state machine driving a binary alert
//!
//! Frame capture, landmark extraction, rendering and audio live outside this
//! crate; it consumes landmark sets and emits [`AlertState`] values.

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod openness;
pub mod state;

pub use analysis::{AlertState, DmsAnalysis, Indicator, MonitorPhase};
pub use calibration::{CalibrationResult, Calibrator};
pub use config::DmsConfig;
pub use data_validator::{EyeSide, Point2D, ValidationError};
pub use openness::{EyeOpennessMeter, EyePoints, OpennessRatio, Sample};
pub use state::{DetectionState, DrowsinessStateMachine, StateMachineState, Timestamp};

use data_validator::Validator;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Degenerate eye landmarks: corner distance is zero")]
    DegenerateLandmarks,

    #[error("No samples collected during calibration")]
    EmptyCalibration,

    #[error("Malformed landmarks: {0}")]
    MalformedLandmarks(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Landmarks delivered by the landmark collaborator for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LandmarkFrame {
    /// No face found
    Absent,
    /// Raw eye landmarks of the first detected subject
    Present {
        left: Vec<Point2D>,
        right: Vec<Point2D>,
    },
}

/// Session phase; a machine only ever exists next to the calibration it
/// was built from
enum Phase {
    Calibrating(Calibrator),
    Monitoring {
        calibration: CalibrationResult,
        machine: DrowsinessStateMachine,
    },
}

/// Driver monitoring module.
///
/// Calibrates on the first `calibration_duration` of ticks, then runs the
/// drowsiness state machine with the derived threshold.
pub struct DmsModule {
    config: DmsConfig,
    validator: Validator,
    origin: Option<Timestamp>,
    phase: Phase,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            validator: Validator::new(config.validation.clone()),
            phase: Phase::Calibrating(Calibrator::new(&config)),
            origin: None,
            config,
        })
    }

    /// Analyze a single tick.
    ///
    /// Malformed landmark sets are reported without touching any state.
    pub fn process(&mut self, frame: &LandmarkFrame, now: Timestamp) -> Result<DmsAnalysis, DmsError> {
        let input = self.detect(frame)?;
        let origin = *self.origin.get_or_insert(now);
        let elapsed = now.saturating_sub(origin);

        if matches!(&self.phase, Phase::Calibrating(calibrator) if !calibrator.is_window_open(elapsed)) {
            self.finish_calibration();
        }

        match &mut self.phase {
            Phase::Calibrating(calibrator) => {
                calibrator.observe(&input);
                Ok(DmsAnalysis {
                    phase: MonitorPhase::Calibrating,
                    sample: input.sample().copied(),
                    ..Default::default()
                })
            }
            Phase::Monitoring { machine, .. } => {
                let alert_state = machine.tick(&input, now);
                Ok(DmsAnalysis {
                    phase: MonitorPhase::Monitoring,
                    alert_state: Some(alert_state),
                    sample: input.sample().copied(),
                    threshold: Some(machine.threshold()),
                    consecutive_closed_frames: machine.state().consecutive_closed_frames,
                    closed_duration: machine.closed_duration(now),
                })
            }
        }
    }

    /// End calibration now, e.g. when the input stream stops early, and
    /// return the recorded result. Once monitoring, returns the existing
    /// result unchanged.
    pub fn finish_calibration(&mut self) -> CalibrationResult {
        let placeholder = Phase::Calibrating(Calibrator::new(&self.config));
        let (calibration, machine) = match std::mem::replace(&mut self.phase, placeholder) {
            Phase::Calibrating(calibrator) => {
                let result = calibrator.finish();
                info!(
                    "Monitoring started with threshold {:.3}, frame check {}",
                    result.threshold, self.config.frame_check
                );
                let machine = DrowsinessStateMachine::from_calibration(&result, self.config.frame_check);
                (result, machine)
            }
            Phase::Monitoring { calibration, machine } => (calibration, machine),
        };

        self.phase = Phase::Monitoring { calibration, machine };
        calibration
    }

    pub fn phase(&self) -> MonitorPhase {
        match self.phase {
            Phase::Calibrating(_) => MonitorPhase::Calibrating,
            Phase::Monitoring { .. } => MonitorPhase::Monitoring,
        }
    }

    /// Calibration outcome, once calibration has finished
    pub fn calibration(&self) -> Option<&CalibrationResult> {
        match &self.phase {
            Phase::Calibrating(_) => None,
            Phase::Monitoring { calibration, .. } => Some(calibration),
        }
    }

    /// Monitoring state, once calibration has finished
    pub fn state(&self) -> Option<&StateMachineState> {
        match &self.phase {
            Phase::Calibrating(_) => None,
            Phase::Monitoring { machine, .. } => Some(machine.state()),
        }
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Reset monitoring state (on subject change), keeping the calibration
    pub fn reset_state(&mut self) {
        if let Phase::Monitoring { machine, .. } = &mut self.phase {
            machine.reset();
        }
    }

    fn detect(&self, frame: &LandmarkFrame) -> Result<DetectionState, DmsError> {
        let (left, right) = match frame {
            LandmarkFrame::Absent => return Ok(DetectionState::SubjectAbsent),
            LandmarkFrame::Present { left, right } => (left, right),
        };

        self.validator.validate_subject(left, right)?;
        let left = EyePoints::from_slice(EyeSide::Left, left)?;
        let right = EyePoints::from_slice(EyeSide::Right, right)?;

        match Sample::from_eyes(&left, &right) {
            Ok(sample) => Ok(DetectionState::SubjectPresent(sample)),
            Err(DmsError::DegenerateLandmarks) => {
                debug!("Both eyes degenerate, treating tick as subject absent");
                Ok(DetectionState::SubjectAbsent)
            }
            Err(e) => Err(e),
        }
    }
}
