//! Settings schema.

mod adapter;
mod transport;

pub use adapter::AdapterSettings;
pub use transport::TransportSettings;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IrisSettings {
    /// Object adapter identity and endpoint.
    pub adapter: AdapterSettings,
    /// Connection acceptance tuning.
    pub transport: TransportSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl IrisSettings {
    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.adapter.name.is_empty() {
            return Err(SettingsError::InvalidValue("adapter.name must not be empty".into()));
        }
        if self.transport.accept_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "transport.acceptTimeoutMs must be positive".into(),
            ));
        }
        if self.transport.error_backoff_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "transport.errorBackoffMs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level, in `EnvFilter` syntax.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
