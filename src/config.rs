use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client settings loaded from `DEPLOYCTL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify the API server certificate. Off unless explicitly enabled.
    #[serde(default)]
    pub verify_tls: bool,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("DEPLOYCTL").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Per-request timeout; a zero setting falls back to the default
    pub fn request_timeout(&self) -> Duration {
        let secs = match self.timeout_secs {
            0 => default_timeout_secs(),
            secs => secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            verify_tls: false,
            log_format: LogFormat::default(),
        }
    }
}
