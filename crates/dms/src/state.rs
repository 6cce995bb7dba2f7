//! Drowsiness state tracking

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::AlertState;
use crate::calibration::CalibrationResult;
use crate::openness::Sample;

/// Monotonic offset from the start of the session
pub type Timestamp = Duration;

/// What the landmark collaborator saw on one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DetectionState {
    SubjectPresent(Sample),
    SubjectAbsent,
}

impl DetectionState {
    /// Present subject with a known averaged ratio
    pub fn present(ratio: f64) -> Self {
        Self::SubjectPresent(Sample::from_ratio(ratio))
    }

    pub fn sample(&self) -> Option<&Sample> {
        match self {
            Self::SubjectPresent(sample) => Some(sample),
            Self::SubjectAbsent => None,
        }
    }
}

/// Mutable state owned by the state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateMachineState {
    /// Consecutive ticks with eyes judged closed
    pub consecutive_closed_frames: u32,

    /// Whether the drowsiness alert is raised
    pub alert_active: bool,

    /// When the current closed run began
    pub drowsiness_started_at: Option<Timestamp>,
}

impl StateMachineState {
    /// Reset state (eyes open or subject gone)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Frame-persistence state machine turning samples into alert states
#[derive(Debug, Clone)]
pub struct DrowsinessStateMachine {
    threshold: f64,
    frame_check: u32,
    state: StateMachineState,
}

impl DrowsinessStateMachine {
    pub fn new(threshold: f64, frame_check: u32) -> Self {
        Self {
            threshold,
            frame_check,
            state: StateMachineState::default(),
        }
    }

    pub fn from_calibration(calibration: &CalibrationResult, frame_check: u32) -> Self {
        Self::new(calibration.threshold, frame_check)
    }

    /// Advance one tick.
    ///
    /// Eyes count as closed only when the ratio is strictly below the
    /// threshold; a ratio equal to the threshold is open.
    pub fn tick(&mut self, input: &DetectionState, now: Timestamp) -> AlertState {
        match input {
            DetectionState::SubjectAbsent => {
                if self.state.alert_active {
                    info!("Subject lost while drowsiness alert was active");
                }
                self.state.reset();
                debug!("Tick: subject absent");
                AlertState::SubjectAbsent
            }
            DetectionState::SubjectPresent(sample) if sample.ratio < self.threshold => {
                if self.state.drowsiness_started_at.is_none() {
                    self.state.drowsiness_started_at = Some(now);
                }
                self.state.consecutive_closed_frames =
                    self.state.consecutive_closed_frames.saturating_add(1);

                debug!(
                    "Tick: eyes closed (ratio {:.3} < {:.3}, {} frames)",
                    sample.ratio, self.threshold, self.state.consecutive_closed_frames
                );

                if self.state.consecutive_closed_frames >= self.frame_check {
                    if !self.state.alert_active {
                        warn!(
                            "Drowsiness alert raised after {} closed frames",
                            self.state.consecutive_closed_frames
                        );
                    }
                    self.state.alert_active = true;
                    AlertState::Alerting
                } else {
                    AlertState::Clear
                }
            }
            DetectionState::SubjectPresent(sample) => {
                if self.state.alert_active {
                    info!("Drowsiness alert cleared (ratio {:.3})", sample.ratio);
                }
                self.state.reset();
                AlertState::Clear
            }
        }
    }

    /// How long the eyes have been closed in the current run
    pub fn closed_duration(&self, now: Timestamp) -> Option<Duration> {
        self.state
            .drowsiness_started_at
            .map(|started| now.saturating_sub(started))
    }

    pub fn state(&self) -> &StateMachineState {
        &self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn frame_check(&self) -> u32 {
        self.frame_check
    }

    /// Return to the initial state, keeping the threshold
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.21;

    fn ms(millis: u64) -> Timestamp {
        Duration::from_millis(millis)
    }

    fn machine() -> DrowsinessStateMachine {
        DrowsinessStateMachine::new(THRESHOLD, 20)
    }

    fn closed() -> DetectionState {
        DetectionState::present(0.1)
    }

    fn open() -> DetectionState {
        DetectionState::present(0.3)
    }

    #[test]
    fn test_initial_state() {
        let machine = machine();
        assert_eq!(*machine.state(), StateMachineState::default());
        assert_eq!(machine.threshold(), THRESHOLD);
        assert_eq!(machine.frame_check(), 20);
    }

    #[test]
    fn test_alert_after_frame_check_closed_ticks() {
        let mut machine = machine();

        for i in 0..19 {
            assert_eq!(machine.tick(&closed(), ms(i * 33)), AlertState::Clear);
            assert!(!machine.state().alert_active);
        }
        assert_eq!(machine.state().consecutive_closed_frames, 19);

        assert_eq!(machine.tick(&closed(), ms(19 * 33)), AlertState::Alerting);
        assert!(machine.state().alert_active);

        // Stays alerting while closed
        assert_eq!(machine.tick(&closed(), ms(20 * 33)), AlertState::Alerting);

        assert_eq!(machine.tick(&open(), ms(21 * 33)), AlertState::Clear);
        assert_eq!(*machine.state(), StateMachineState::default());
    }

    #[test]
    fn test_open_tick_breaks_the_run() {
        let mut machine = machine();
        for i in 0..15 {
            machine.tick(&closed(), ms(i));
        }
        machine.tick(&open(), ms(15));
        for i in 16..35 {
            assert_eq!(machine.tick(&closed(), ms(i)), AlertState::Clear);
        }
        assert_eq!(machine.tick(&closed(), ms(35)), AlertState::Alerting);
    }

    #[test]
    fn test_threshold_boundary_is_open() {
        let mut machine = DrowsinessStateMachine::new(THRESHOLD, 1);
        assert_eq!(
            machine.tick(&DetectionState::present(THRESHOLD), ms(0)),
            AlertState::Clear
        );
        assert_eq!(machine.state().consecutive_closed_frames, 0);

        let just_below = THRESHOLD - f64::EPSILON;
        assert_eq!(
            machine.tick(&DetectionState::present(just_below), ms(1)),
            AlertState::Alerting
        );
    }

    #[test]
    fn test_subject_absent_resets() {
        let mut machine = machine();
        for i in 0..25 {
            machine.tick(&closed(), ms(i));
        }
        assert!(machine.state().alert_active);

        assert_eq!(
            machine.tick(&DetectionState::SubjectAbsent, ms(25)),
            AlertState::SubjectAbsent
        );
        assert_eq!(*machine.state(), StateMachineState::default());
    }

    #[test]
    fn test_subject_absent_never_alerts() {
        let mut machine = DrowsinessStateMachine::new(THRESHOLD, 1);
        for i in 0..100 {
            assert_eq!(
                machine.tick(&DetectionState::SubjectAbsent, ms(i)),
                AlertState::SubjectAbsent
            );
        }
        assert_eq!(machine.state().consecutive_closed_frames, 0);
    }

    #[test]
    fn test_closed_duration_tracks_run_start() {
        let mut machine = machine();
        assert_eq!(machine.closed_duration(ms(0)), None);

        machine.tick(&closed(), ms(100));
        machine.tick(&closed(), ms(133));
        assert_eq!(machine.state().drowsiness_started_at, Some(ms(100)));
        assert_eq!(machine.closed_duration(ms(600)), Some(ms(500)));

        machine.tick(&open(), ms(700));
        assert_eq!(machine.closed_duration(ms(800)), None);
    }

    #[test]
    fn test_from_calibration_uses_threshold() {
        let calibration = CalibrationResult::fallback(0.25, (0.1, 0.4));
        let machine = DrowsinessStateMachine::from_calibration(&calibration, 5);
        assert_eq!(machine.threshold(), 0.25);
        assert_eq!(machine.frame_check(), 5);
    }

    #[test]
    fn test_reset_keeps_threshold() {
        let mut machine = machine();
        machine.tick(&closed(), ms(0));
        machine.reset();
        assert_eq!(*machine.state(), StateMachineState::default());
        assert_eq!(machine.threshold(), THRESHOLD);
    }
}
