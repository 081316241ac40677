//! Connection acceptance settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the accept loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportSettings {
    /// Upper bound of a single `accept` wait in milliseconds.
    pub accept_timeout_ms: u64,
    /// Pause after a failed `accept` before retrying, in milliseconds.
    pub error_backoff_ms: u64,
    /// Time to wait for connection tasks on shutdown, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl TransportSettings {
    /// [`Self::accept_timeout_ms`] as a `Duration`.
    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    /// [`Self::error_backoff_ms`] as a `Duration`.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    /// [`Self::shutdown_timeout_ms`] as a `Duration`.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            accept_timeout_ms: 1_000,
            error_backoff_ms: 100,
            shutdown_timeout_ms: 30_000,
        }
    }
}
