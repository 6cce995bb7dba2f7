//! Drowsiness Monitor Tick Driver
//!
//! Feeds recorded eye landmark streams through the DMS module one tick at a
//! time and drives the audio alert from the resulting alert states.

pub mod record;
pub mod replay;
pub mod settings;

pub use record::{parse_record, FrameRecord, SubjectLandmarks};
pub use replay::{replay, ReplayOptions, ReplaySummary};
pub use settings::MonitorSettings;

use alerting::AlertError;
use dms::DmsError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: invalid frame record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Alert(#[from] AlertError),
}

/// Initialize logging
pub fn init_logging(debug: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
