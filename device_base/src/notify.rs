/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde_json::Value;

/// Topics published on the notification bus. The UI is the consumer;
/// the engine only ever emits.
pub mod topics {
    pub const DEVICE_STATUS: &str = "device:status";
    pub const EVENT_NEW: &str = "event:new";
    pub const DEVICE_DELETED: &str = "device:deleted";
    pub const MONITORING_STARTED: &str = "monitoring:started";
    pub const MONITORING_STOPPED: &str = "monitoring:stopped";
    pub const SETTINGS_CHANGED: &str = "settings:changed";
}

/// Best-effort fan-out to the UI. Implementations must not block; a
/// lost notification is acceptable, a delayed probe is not.
pub trait Notifier: Send + Sync {
    fn emit(&self, topic: &str, payload: Value);
}
