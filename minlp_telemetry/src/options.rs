use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// Settings of a [`TelemetryWriter`](crate::TelemetryWriter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryOptions {
    /// Stamped on every message as the envelope `name`.
    pub name: String,
    pub run_id: String,
    /// When off every writer call is a no-op.
    pub enabled: bool,
    /// Check add/prune events against a [`BabNodeTracker`](crate::BabNodeTracker). Violations are
    /// still written and are also returned to the caller.
    pub validate_protocol: bool,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            name: "minlp".to_string(),
            run_id: String::new(),
            enabled: true,
            validate_protocol: true,
        }
    }
}

impl TelemetryOptions {
    pub fn from_json_str(s: &str) -> Result<Self, TelemetryError> {
        Ok(serde_json::from_str(s)?)
    }
}
