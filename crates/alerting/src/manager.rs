//! Alert Manager Implementation

use std::path::PathBuf;

use dms::AlertState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sink::{AudioSink, LogSink};
use crate::AlertError;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Whether the alert sound is used at all
    pub enabled: bool,
    /// Sound file handed to the audio device
    pub sound_path: Option<PathBuf>,
    /// Playback volume (default: 0.5)
    pub volume: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_path: Some(PathBuf::from("music.wav")),
            volume: 0.5,
        }
    }
}

/// What an update did to the audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackChange {
    Started,
    Stopped,
    Unchanged,
}

/// Alert manager keeping the audio device in step with alert states
pub struct AlertManager<S: AudioSink> {
    /// Configuration
    config: AlertConfig,
    /// Audio device
    sink: S,
    /// Last state applied
    last_state: Option<AlertState>,
    /// Number of times the sound was started
    start_count: usize,
}

impl<S: AudioSink> AlertManager<S> {
    /// Create a new alert manager
    pub fn new(config: AlertConfig, sink: S) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            sink,
            last_state: None,
            start_count: 0,
        }
    }

    /// Apply one tick's alert state.
    ///
    /// Starts the sound only if it is not already playing and stops it only
    /// if it is, so a sustained alert never restarts playback.
    pub fn update(&mut self, state: AlertState) -> Result<PlaybackChange, AlertError> {
        let desired = self.config.enabled && state.should_sound();
        let playing = self.sink.is_playing();

        if self.last_state != Some(state) {
            debug!("Alert state changed: {:?} -> {:?}", self.last_state, state);
        }
        self.last_state = Some(state);

        if desired && !playing {
            self.sink.play()?;
            self.start_count += 1;
            info!("Alert sound on for {:?} (count: {})", state, self.start_count);
            Ok(PlaybackChange::Started)
        } else if !desired && playing {
            self.sink.stop()?;
            info!("Alert sound off ({:?})", state);
            Ok(PlaybackChange::Stopped)
        } else {
            Ok(PlaybackChange::Unchanged)
        }
    }

    /// Stop the sound if it is playing (on shutdown)
    pub fn silence(&mut self) -> Result<PlaybackChange, AlertError> {
        if self.sink.is_playing() {
            self.sink.stop()?;
            Ok(PlaybackChange::Stopped)
        } else {
            Ok(PlaybackChange::Unchanged)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sink.is_playing()
    }

    /// Get the number of times the sound was started
    pub fn start_count(&self) -> usize {
        self.start_count
    }

    pub fn last_state(&self) -> Option<AlertState> {
        self.last_state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl AlertManager<LogSink> {
    /// Manager backed by a [`LogSink`] built from the config
    pub fn with_log_sink(config: AlertConfig) -> Self {
        let sink = LogSink::new(config.sound_path.clone(), config.volume);
        Self::new(config, sink)
    }
}

impl Default for AlertManager<LogSink> {
    fn default() -> Self {
        Self::with_log_sink(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        playing: bool,
        plays: usize,
        stops: usize,
        fail: bool,
    }

    impl AudioSink for CountingSink {
        fn play(&mut self) -> Result<(), AlertError> {
            if self.fail {
                return Err(AlertError::Playback("device busy".into()));
            }
            assert!(!self.playing, "play() called while already playing");
            self.playing = true;
            self.plays += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AlertError> {
            assert!(self.playing, "stop() called while idle");
            self.playing = false;
            self.stops += 1;
            Ok(())
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn manager() -> AlertManager<CountingSink> {
        AlertManager::new(AlertConfig::default(), CountingSink::default())
    }

    #[test]
    fn test_sustained_alert_plays_once() {
        let mut manager = manager();

        assert_eq!(manager.update(AlertState::Alerting).unwrap(), PlaybackChange::Started);
        for _ in 0..10 {
            assert_eq!(manager.update(AlertState::Alerting).unwrap(), PlaybackChange::Unchanged);
        }
        assert_eq!(manager.sink().plays, 1);
        assert_eq!(manager.start_count(), 1);
    }

    #[test]
    fn test_absent_and_alerting_share_the_sound() {
        let mut manager = manager();

        manager.update(AlertState::SubjectAbsent).unwrap();
        assert!(manager.is_playing());

        // Switching alert cause keeps the same sound running
        assert_eq!(manager.update(AlertState::Alerting).unwrap(), PlaybackChange::Unchanged);
        assert_eq!(manager.sink().plays, 1);
        assert_eq!(manager.last_state(), Some(AlertState::Alerting));
    }

    #[test]
    fn test_clear_stops_only_when_playing() {
        let mut manager = manager();

        assert_eq!(manager.update(AlertState::Clear).unwrap(), PlaybackChange::Unchanged);
        manager.update(AlertState::Alerting).unwrap();
        assert_eq!(manager.update(AlertState::Clear).unwrap(), PlaybackChange::Stopped);
        assert_eq!(manager.update(AlertState::Clear).unwrap(), PlaybackChange::Unchanged);

        assert_eq!(manager.sink().stops, 1);
    }

    #[test]
    fn test_disabled_never_plays() {
        let config = AlertConfig {
            enabled: false,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config, CountingSink::default());

        assert_eq!(manager.update(AlertState::Alerting).unwrap(), PlaybackChange::Unchanged);
        assert!(!manager.is_playing());
    }

    #[test]
    fn test_playback_error_is_propagated() {
        let sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let mut manager = AlertManager::new(AlertConfig::default(), sink);

        let err = manager.update(AlertState::Alerting).unwrap_err();
        assert_eq!(err, AlertError::Playback("device busy".into()));
        assert_eq!(manager.start_count(), 0);
    }

    #[test]
    fn test_silence() {
        let mut manager = manager();
        assert_eq!(manager.silence().unwrap(), PlaybackChange::Unchanged);
        manager.update(AlertState::SubjectAbsent).unwrap();
        assert_eq!(manager.silence().unwrap(), PlaybackChange::Stopped);
        assert!(!manager.is_playing());
    }

    #[test]
    fn test_default_uses_log_sink() {
        let mut manager = AlertManager::default();
        assert_eq!(manager.update(AlertState::Alerting).unwrap(), PlaybackChange::Started);
        assert!(manager.sink().is_playing());
    }
}
