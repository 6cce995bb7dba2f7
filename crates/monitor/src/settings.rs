//! Layered monitor settings
//!
//! Defaults, then an optional config file, then `DROWSY_`-prefixed
//! environment variables (`DROWSY_DMS__FRAME_CHECK=10`).

use std::path::Path;

use alerting::AlertConfig;
use dms::DmsConfig;
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DROWSY";

/// Monitor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Decision core
    pub dms: DmsConfig,
    /// Audio alert
    pub alert: AlertConfig,
}

impl MonitorSettings {
    /// Load settings, reading `path` if given
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_with_env(path, None)
    }

    /// Load settings with an explicit environment in place of the process
    /// environment (`None` reads the process environment)
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, MonitorError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.dms.validate()?;
        Ok(settings)
    }
}
