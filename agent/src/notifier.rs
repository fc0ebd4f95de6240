/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use device_base::Notifier;

/// Stand-in for the UI notification bus: bus traffic goes to the log
/// so a headless agent run stays observable.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        log::debug!("notify {}: {}", topic, payload);
    }
}
