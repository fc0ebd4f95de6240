/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

use device_base::DeviceStatus;

/// The normalized outcome of a device probe, whatever the protocol
/// path taken. Rich errors stay inside the protocol crates; only the
/// diagnostic string crosses this boundary, and it enters event
/// messages on offline transitions only.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProbeReport {
    pub status: DeviceStatus,
    pub latency_ms: f64,
    #[serde(default)]
    pub diagnostic: Option<String>,
}

impl ProbeReport {
    pub fn online(latency_ms: f64) -> Self {
        Self {
            status: DeviceStatus::Online,
            latency_ms,
            diagnostic: None,
        }
    }

    pub fn offline(diagnostic: impl Into<Option<String>>) -> Self {
        Self {
            status: DeviceStatus::Offline,
            latency_ms: 0.0,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: String) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }
}
