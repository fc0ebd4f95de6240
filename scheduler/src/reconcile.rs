/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::BTreeMap;
use std::sync::Arc;

use device_base::{
    DeviceId, DeviceStore, EventLevel, EventType, NewEvent, PortStatus,
};
use snmp_protocol::{IfOperStatus, TFortisSwitch};

use crate::sink::EventSink;

/// Walk the authoritative per-port link state of a switch that just
/// answered SNMP and fold differences back into the stored ports,
/// emitting one event per change. Runs detached from the probe task
/// that scheduled it.
pub async fn reconcile_ports(
    switch: TFortisSwitch,
    device_id: DeviceId,
    port_count: u32,
    store: Arc<dyn DeviceStore>,
    sink: Arc<EventSink>,
) {
    let walked = match switch.walk_oper_status(port_count).await {
        Ok(walked) => walked,
        Err(e) => {
            log::debug!(
                "reconcile device {}: walk failed: {}",
                device_id,
                e
            );
            return;
        }
    };
    apply_port_statuses(device_id, &walked, store, sink).await;
}

pub(crate) async fn apply_port_statuses(
    device_id: DeviceId,
    walked: &BTreeMap<u32, IfOperStatus>,
    store: Arc<dyn DeviceStore>,
    sink: Arc<EventSink>,
) {
    let ports = match store.ports(device_id).await {
        Ok(ports) => ports,
        Err(e) => {
            log::warn!(
                "reconcile device {}: failed to load ports: {}",
                device_id,
                e
            );
            return;
        }
    };

    for port in ports {
        let Some(new_status) = walked
            .get(&port.port_number)
            .map(|status| PortStatus::from(*status))
        else {
            // Interfaces beyond the walk cap or missing from the
            // reply are left as they are.
            continue;
        };
        if new_status == port.status {
            continue;
        }

        if let Err(e) =
            store.update_port_status(port.id, new_status).await
        {
            log::warn!(
                "reconcile device {}: failed to update port {}: {}",
                device_id,
                port.port_number,
                e
            );
            continue;
        }

        let (event_type, level) = match new_status {
            PortStatus::Up => (EventType::PortUp, EventLevel::Info),
            _ => (EventType::PortDown, EventLevel::Warning),
        };
        sink.emit_event(NewEvent {
            device_id: Some(device_id),
            event_type,
            level,
            message: format!(
                "Port {} changed from {} to {}",
                port.port_number, port.status, new_status
            ),
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sink_for, FakeWorld};
    use device_base::topics;

    #[tokio::test]
    async fn changed_port_updates_store_and_emits() {
        let world = FakeWorld::new();
        world.add_port(1, 10, 5, PortStatus::Up);
        let sink = sink_for(&world);

        let walked =
            BTreeMap::from([(5, IfOperStatus::Down)]);
        apply_port_statuses(
            DeviceId(10),
            &walked,
            world.clone(),
            sink,
        )
        .await;

        assert_eq!(world.ports.lock()[0].status, PortStatus::Down);
        let events = world.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::PortDown);
        assert_eq!(events[0].level, EventLevel::Warning);
        assert_eq!(events[0].message, "Port 5 changed from up to down");
        assert!(world
            .notifications
            .lock()
            .iter()
            .any(|(topic, _)| topic == topics::EVENT_NEW));
    }

    #[tokio::test]
    async fn coming_up_is_an_info_event() {
        let world = FakeWorld::new();
        world.add_port(1, 10, 2, PortStatus::Down);
        let sink = sink_for(&world);

        let walked = BTreeMap::from([(2, IfOperStatus::Up)]);
        apply_port_statuses(DeviceId(10), &walked, world.clone(), sink)
            .await;

        let events = world.events.lock();
        assert_eq!(events[0].event_type, EventType::PortUp);
        assert_eq!(events[0].level, EventLevel::Info);
        assert_eq!(events[0].message, "Port 2 changed from down to up");
    }

    #[tokio::test]
    async fn unchanged_and_unwalked_ports_stay_silent() {
        let world = FakeWorld::new();
        world.add_port(1, 10, 1, PortStatus::Up);
        world.add_port(2, 10, 9, PortStatus::Down);
        let sink = sink_for(&world);

        // Port 1 unchanged; port 9 beyond the walk cap.
        let walked = BTreeMap::from([(1, IfOperStatus::Up)]);
        apply_port_statuses(DeviceId(10), &walked, world.clone(), sink)
            .await;

        assert!(world.events.lock().is_empty());
        assert_eq!(world.ports.lock()[1].status, PortStatus::Down);
    }

    #[tokio::test]
    async fn testing_state_maps_to_unknown() {
        let world = FakeWorld::new();
        world.add_port(1, 10, 3, PortStatus::Up);
        let sink = sink_for(&world);

        let walked = BTreeMap::from([(3, IfOperStatus::Testing)]);
        apply_port_statuses(DeviceId(10), &walked, world.clone(), sink)
            .await;

        assert_eq!(world.ports.lock()[0].status, PortStatus::Unknown);
        let events = world.events.lock();
        assert_eq!(events[0].event_type, EventType::PortDown);
        assert_eq!(
            events[0].message,
            "Port 3 changed from up to unknown"
        );
    }
}
