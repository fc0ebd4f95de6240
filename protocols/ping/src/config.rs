/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct PingConfig {
    /// Echo requests sent per probe.
    pub count: u16,
    /// Per-probe timeout in seconds.
    pub timeout: f64,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            count: 3,
            timeout: 3.0,
        }
    }
}

impl PingConfig {
    pub(crate) fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.timeout)
    }
}
