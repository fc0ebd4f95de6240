/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

/// Monitoring knobs. All intervals and timeouts are in seconds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick interval of the periodic fan-out.
    pub interval: f64,
    /// Per-probe timeout for ICMP/TCP reachability checks.
    pub ping_timeout: f64,
    /// Per-request timeout for SNMP round-trips.
    pub snmp_timeout: f64,
    /// Parallel probe workers.
    pub workers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            interval: 30.0,
            ping_timeout: 3.0,
            snmp_timeout: 5.0,
            workers: 10,
        }
    }
}

impl MonitorConfig {
    pub fn interval_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.interval)
    }

    pub fn ping_timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.ping_timeout)
    }
}
