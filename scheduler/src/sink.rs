/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::sync::Arc;

use serde_json::json;

use device_base::{
    topics, DeviceId, DeviceStatus, EventStore, HistoryStore, NewEvent,
    Notifier,
};

/// The two append-only sinks of the engine: status history and
/// events. Each write has two independent effects, persist and
/// publish, in that order; a failure in either is logged and does not
/// suppress the other. Monitoring never stops because a sink is
/// unhappy.
pub struct EventSink {
    history: Arc<dyn HistoryStore>,
    events: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
}

impl EventSink {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        events: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            history,
            events,
            notifier,
        }
    }

    pub async fn record_history(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        latency_ms: f64,
    ) {
        if let Err(e) =
            self.history.record(device_id, status, latency_ms).await
        {
            log::warn!(
                "failed to record status history for device {}: {}",
                device_id,
                e
            );
        }
        self.notifier.emit(
            topics::DEVICE_STATUS,
            json!({
                "device_id": device_id,
                "status": status,
                "latency_ms": latency_ms,
            }),
        );
    }

    pub async fn emit_event(&self, event: NewEvent) {
        log::info!(
            "event [{}] {}: {}",
            event.level,
            event.event_type,
            event.message
        );
        if let Err(e) = self.events.create(event.clone()).await {
            log::warn!("failed to persist event: {}", e);
        }
        self.notifier.emit(
            topics::EVENT_NEW,
            json!({
                "device_id": event.device_id,
                "type": event.event_type,
                "level": event.level,
                "message": event.message,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sink_for, FakeWorld};
    use device_base::{EventLevel, EventType};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn history_is_persisted_and_published() {
        let world = FakeWorld::new();
        let sink = sink_for(&world);

        sink.record_history(DeviceId(3), DeviceStatus::Online, 4.2)
            .await;

        assert_eq!(
            world.history.lock().as_slice(),
            &[(DeviceId(3), DeviceStatus::Online, 4.2)]
        );
        let notifications = world.notifications.lock();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].0, topics::DEVICE_STATUS);
        assert_eq!(notifications[0].1["latency_ms"], 4.2);
    }

    #[tokio::test]
    async fn persist_failure_does_not_suppress_publish() {
        let world = FakeWorld::new();
        world.fail_history.store(true, Ordering::SeqCst);
        world.fail_events.store(true, Ordering::SeqCst);
        let sink = sink_for(&world);

        sink.record_history(DeviceId(1), DeviceStatus::Offline, 0.0)
            .await;
        sink.emit_event(NewEvent {
            device_id: Some(DeviceId(1)),
            event_type: EventType::DeviceOffline,
            level: EventLevel::Error,
            message: String::from("Device d is offline"),
        })
        .await;

        assert!(world.history.lock().is_empty());
        assert!(world.events.lock().is_empty());
        let notifications = world.notifications.lock();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].0, topics::DEVICE_STATUS);
        assert_eq!(notifications[1].0, topics::EVENT_NEW);
    }
}
