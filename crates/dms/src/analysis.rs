//! DMS analysis results and alerts

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::openness::Sample;

/// Decision emitted for each monitoring tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertState {
    /// Eyes open, or closed for fewer than `frame_check` ticks
    Clear,

    /// Eyes closed for at least `frame_check` consecutive ticks
    Alerting,

    /// No trackable subject in the frame
    SubjectAbsent,
}

impl AlertState {
    /// Whether the audio alert should be playing.
    ///
    /// Drowsiness and a missing subject share the same sound.
    pub fn should_sound(&self) -> bool {
        matches!(self, AlertState::Alerting | AlertState::SubjectAbsent)
    }

    /// Overlay text for renderers
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            AlertState::Clear => None,
            AlertState::Alerting => Some("DROWSINESS ALERT!"),
            AlertState::SubjectAbsent => Some("Face Not Found"),
        }
    }

    /// Colour intent for the subject bounding box
    pub fn indicator(&self) -> Indicator {
        match self {
            AlertState::Alerting => Indicator::Warning,
            AlertState::Clear | AlertState::SubjectAbsent => Indicator::Normal,
        }
    }
}

/// Colour intent for overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indicator {
    Normal,
    Warning,
}

impl Indicator {
    /// RGB colour conventionally used for this intent
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Indicator::Normal => (0, 255, 0),
            Indicator::Warning => (255, 0, 0),
        }
    }
}

/// Which half of the session a tick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonitorPhase {
    #[default]
    Calibrating,
    Monitoring,
}

impl MonitorPhase {
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            MonitorPhase::Calibrating => Some("Look at the camera for calibration..."),
            MonitorPhase::Monitoring => None,
        }
    }
}

/// Complete DMS analysis result for one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Calibration or monitoring
    pub phase: MonitorPhase,

    /// Alert decision, only produced while monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_state: Option<AlertState>,

    /// Averaged openness sample (if a subject was found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<Sample>,

    /// Calibrated threshold, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Consecutive closed-eye ticks so far
    pub consecutive_closed_frames: u32,

    /// Time since the current closed run began
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_duration: Option<Duration>,
}

impl DmsAnalysis {
    /// Check if the alert sound should be playing
    pub fn should_sound(&self) -> bool {
        self.alert_state.is_some_and(|state| state.should_sound())
    }

    /// Banner a renderer would show for this tick
    pub fn banner(&self) -> Option<&'static str> {
        match self.alert_state {
            Some(state) => state.banner(),
            None => self.phase.banner(),
        }
    }
}
