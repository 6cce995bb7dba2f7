//! Alerting System
//!
//! Turns per-tick alert decisions into idempotent start/stop calls on an
//! audio device.

mod manager;
mod sink;

pub use manager::{AlertConfig, AlertManager, PlaybackChange};
pub use sink::{AudioSink, LogSink};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("Playback failed: {0}")]
    Playback(String),
}
