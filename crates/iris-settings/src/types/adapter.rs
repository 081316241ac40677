//! Object adapter settings.

use serde::{Deserialize, Serialize};

/// Name and listening endpoint of the object adapter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterSettings {
    /// Adapter name, used in diagnostics.
    pub name: String,
    /// Listening endpoint, e.g. `tcp -h 127.0.0.1 -p 4061` or `unix -f /run/iris.sock`.
    pub endpoint: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            name: "Adapter".to_string(),
            endpoint: "tcp -h 127.0.0.1 -p 0".to_string(),
        }
    }
}
