//! Audio sinks

use std::path::PathBuf;

use tracing::info;

use crate::AlertError;

/// Audio device that can play one looping alert sound
pub trait AudioSink {
    /// Start the alert sound
    fn play(&mut self) -> Result<(), AlertError>;

    /// Stop the alert sound
    fn stop(&mut self) -> Result<(), AlertError>;

    /// Whether the sound is currently playing
    fn is_playing(&self) -> bool;
}

/// Sink that only logs playback changes.
///
/// Stands in for a real device when running headless or replaying
/// recordings.
#[derive(Debug, Default)]
pub struct LogSink {
    sound: Option<PathBuf>,
    volume: f32,
    playing: bool,
}

impl LogSink {
    pub fn new(sound: Option<PathBuf>, volume: f32) -> Self {
        Self {
            sound,
            volume,
            playing: false,
        }
    }
}

impl AudioSink for LogSink {
    fn play(&mut self) -> Result<(), AlertError> {
        match &self.sound {
            Some(path) => info!("Alert sound started: {} (volume {:.2})", path.display(), self.volume),
            None => info!("Alert sound started (volume {:.2})", self.volume),
        }
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AlertError> {
        info!("Alert sound stopped");
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
