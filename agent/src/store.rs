/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use device_base::{
    CameraConfig, Credential, CredentialId, CredentialStore, Device,
    DeviceClass, DeviceId, DeviceStatus, DeviceStore, Event, EventId,
    EventStore, HistoryId, HistoryStore, NewEvent, PortId, PortStatus,
    PortType, ServerConfig, StatusHistory, SwitchConfig, SwitchPort,
};

use crate::config::AgentConfig;
use crate::error::{Error, Result};

/// In-memory repository behind the store traits, loaded from the
/// config file at startup. Every mutation is per-row atomic under one
/// lock, which is all the engine relies on.
#[derive(Default)]
pub struct MemoryStore {
    devices: Mutex<BTreeMap<i64, Device>>,
    switch_configs: Mutex<HashMap<i64, SwitchConfig>>,
    camera_configs: Mutex<HashMap<i64, CameraConfig>>,
    server_configs: Mutex<HashMap<i64, ServerConfig>>,
    credentials: Mutex<HashMap<i64, Credential>>,
    ports: Mutex<Vec<SwitchPort>>,
    history: Mutex<Vec<StatusHistory>>,
    events: Mutex<Vec<Event>>,
    next_port_id: AtomicI64,
    next_history_id: AtomicI64,
    next_event_id: AtomicI64,
}

/// The type a port number must have given the switch layout.
fn port_type_for(number: u32, port_count: u32, sfp_count: u32) -> PortType {
    match number > port_count.saturating_sub(sfp_count) {
        true => PortType::Sfp,
        false => PortType::Copper,
    }
}

impl MemoryStore {
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let store = MemoryStore::default();

        for entry in &config.credentials {
            store.credentials.lock().insert(
                entry.id,
                Credential {
                    id: CredentialId(entry.id),
                    name: entry.name.clone(),
                    kind: entry
                        .kind
                        .clone()
                        .unwrap_or_else(|| String::from("device")),
                    username: entry.username.clone(),
                    password: entry.password.clone(),
                    note: entry.note.clone(),
                },
            );
        }

        for entry in &config.devices {
            store.devices.lock().insert(
                entry.id,
                Device {
                    id: DeviceId(entry.id),
                    name: entry.name.clone(),
                    ip: entry.ip.clone(),
                    class: entry.class,
                    status: DeviceStatus::Unknown,
                    last_check: None,
                    credential_id: entry.credential_id,
                },
            );

            if let Some(switch) = &entry.switch {
                store.switch_configs.lock().insert(
                    entry.id,
                    SwitchConfig {
                        device_id: DeviceId(entry.id),
                        snmp_version: switch.snmp_version,
                        read_community: switch.read_community.clone(),
                        write_community: switch.write_community.clone(),
                        usm: switch.usm.clone(),
                        port_count: switch.port_count,
                        sfp_port_count: switch.sfp_port_count,
                        uplink_port: switch.uplink_port,
                    },
                );
                store.create_ports(entry, switch)?;
            }
            if let Some(camera) = &entry.camera {
                store.camera_configs.lock().insert(
                    entry.id,
                    CameraConfig {
                        device_id: DeviceId(entry.id),
                        rtsp_url: camera.rtsp_url.clone(),
                        onvif_port: camera.onvif_port,
                        snapshot_url: camera.snapshot_url.clone(),
                        stream_type: camera.stream_type.clone(),
                    },
                );
            }
            if let Some(server) = &entry.server {
                store.server_configs.lock().insert(
                    entry.id,
                    ServerConfig {
                        device_id: DeviceId(entry.id),
                        tcp_ports: server.tcp_ports.clone(),
                        uplink_port: server.uplink_port,
                    },
                );
            }
        }

        Ok(store)
    }

    fn create_ports(
        &self,
        entry: &crate::config::DeviceEntry,
        switch: &crate::config::SwitchEntry,
    ) -> Result<()> {
        let overrides: HashMap<u32, &crate::config::PortEntry> = switch
            .ports
            .iter()
            .map(|port| (port.number, port))
            .collect();

        let mut ports = self.ports.lock();
        for number in 1..=switch.port_count {
            let port_type = port_type_for(
                number,
                switch.port_count,
                switch.sfp_port_count,
            );
            let over = overrides.get(&number);

            let linked_camera = over.and_then(|o| o.linked_camera);
            let linked_switch = over.and_then(|o| o.linked_switch);
            if linked_camera.is_some() && port_type != PortType::Copper {
                return Err(Error::InvalidDevice(
                    entry.name.clone(),
                    format!(
                        "port {}: camera link requires a copper port",
                        number
                    ),
                ));
            }
            if linked_switch.is_some() && port_type != PortType::Sfp {
                return Err(Error::InvalidDevice(
                    entry.name.clone(),
                    format!(
                        "port {}: uplink requires an sfp port",
                        number
                    ),
                ));
            }

            ports.push(SwitchPort {
                id: PortId(
                    self.next_port_id.fetch_add(1, Ordering::SeqCst) + 1,
                ),
                device_id: DeviceId(entry.id),
                port_number: number,
                name: over
                    .and_then(|o| o.name.clone())
                    .unwrap_or_else(|| format!("Port {}", number)),
                status: PortStatus::Unknown,
                speed_bps: None,
                port_type,
                linked_camera: linked_camera.map(DeviceId),
                linked_switch: linked_switch.map(DeviceId),
            });
        }
        Ok(())
    }

    /// Re-shape a switch: reassign port types from the new layout and
    /// clear the links the new types no longer allow, atomically with
    /// the type update.
    pub fn update_switch_layout(
        &self,
        device_id: DeviceId,
        port_count: u32,
        sfp_port_count: u32,
    ) -> Result<()> {
        {
            let mut configs = self.switch_configs.lock();
            let config = configs
                .get_mut(&device_id.0)
                .ok_or(device_base::Error::DeviceNotFound(device_id))?;
            config.port_count = port_count;
            config.sfp_port_count = sfp_port_count;
        }

        let mut ports = self.ports.lock();
        ports.retain(|port| {
            port.device_id != device_id || port.port_number <= port_count
        });
        let present: Vec<u32> = ports
            .iter()
            .filter(|port| port.device_id == device_id)
            .map(|port| port.port_number)
            .collect();
        for number in 1..=port_count {
            if !present.contains(&number) {
                ports.push(SwitchPort {
                    id: PortId(
                        self.next_port_id.fetch_add(1, Ordering::SeqCst)
                            + 1,
                    ),
                    device_id,
                    port_number: number,
                    name: format!("Port {}", number),
                    status: PortStatus::Unknown,
                    speed_bps: None,
                    port_type: port_type_for(
                        number,
                        port_count,
                        sfp_port_count,
                    ),
                    linked_camera: None,
                    linked_switch: None,
                });
            }
        }
        for port in ports
            .iter_mut()
            .filter(|port| port.device_id == device_id)
        {
            port.port_type = port_type_for(
                port.port_number,
                port_count,
                sfp_port_count,
            );
            match port.port_type {
                PortType::Copper => port.linked_switch = None,
                PortType::Sfp => port.linked_camera = None,
            }
        }
        Ok(())
    }

    pub fn history_rows(&self) -> Vec<StatusHistory> {
        self.history.lock().clone()
    }

    pub fn event_rows(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl DeviceStore for MemoryStore {
    async fn get_all(&self) -> device_base::Result<Vec<Device>> {
        Ok(self.devices.lock().values().cloned().collect())
    }

    async fn get_by_id(
        &self,
        id: DeviceId,
    ) -> device_base::Result<Device> {
        self.devices
            .lock()
            .get(&id.0)
            .cloned()
            .ok_or(device_base::Error::DeviceNotFound(id))
    }

    async fn get_by_class(
        &self,
        class: DeviceClass,
    ) -> device_base::Result<Vec<Device>> {
        Ok(self
            .devices
            .lock()
            .values()
            .filter(|device| device.class == class)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        last_check: DateTime<Utc>,
    ) -> device_base::Result<()> {
        let mut devices = self.devices.lock();
        let device = devices
            .get_mut(&id.0)
            .ok_or(device_base::Error::DeviceNotFound(id))?;
        device.status = status;
        device.last_check = Some(last_check);
        Ok(())
    }

    async fn switch_config(
        &self,
        id: DeviceId,
    ) -> device_base::Result<Option<SwitchConfig>> {
        Ok(self.switch_configs.lock().get(&id.0).cloned())
    }

    async fn camera_config(
        &self,
        id: DeviceId,
    ) -> device_base::Result<Option<CameraConfig>> {
        Ok(self.camera_configs.lock().get(&id.0).cloned())
    }

    async fn server_config(
        &self,
        id: DeviceId,
    ) -> device_base::Result<Option<ServerConfig>> {
        Ok(self.server_configs.lock().get(&id.0).cloned())
    }

    async fn ports(
        &self,
        id: DeviceId,
    ) -> device_base::Result<Vec<SwitchPort>> {
        Ok(self
            .ports
            .lock()
            .iter()
            .filter(|port| port.device_id == id)
            .cloned()
            .collect())
    }

    async fn update_port_status(
        &self,
        id: PortId,
        status: PortStatus,
    ) -> device_base::Result<()> {
        let mut ports = self.ports.lock();
        let port = ports
            .iter_mut()
            .find(|port| port.id == id)
            .ok_or(device_base::Error::PortNotFound(id))?;
        port.status = status;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn record(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        latency_ms: f64,
    ) -> device_base::Result<()> {
        self.history.lock().push(StatusHistory {
            id: HistoryId(
                self.next_history_id.fetch_add(1, Ordering::SeqCst) + 1,
            ),
            device_id,
            status,
            latency_ms,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create(&self, event: NewEvent) -> device_base::Result<()> {
        self.events.lock().push(Event {
            id: EventId(
                self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1,
            ),
            device_id: event.device_id,
            event_type: event.event_type,
            level: event.level,
            message: event.message,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get_by_id(
        &self,
        id: CredentialId,
    ) -> device_base::Result<Credential> {
        self.credentials
            .lock()
            .get(&id.0)
            .cloned()
            .ok_or(device_base::Error::CredentialNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;

    fn store_with_switch() -> MemoryStore {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "devices": [
                    { "id": 1, "name": "sw1", "ip": "10.0.0.2",
                      "class": "switch",
                      "switch": { "snmp_version": "v2c",
                                  "read_community": "public",
                                  "port_count": 8,
                                  "sfp_port_count": 2,
                                  "ports": [
                                    { "number": 3, "linked_camera": 7 },
                                    { "number": 8, "linked_switch": 9 }
                                  ] } }
                ]
            }"#,
        )
        .unwrap();
        MemoryStore::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn ports_follow_the_layout_invariant() {
        let store = store_with_switch();
        let ports = store.ports(DeviceId(1)).await.unwrap();
        assert_eq!(ports.len(), 8);
        for port in &ports {
            let expected = match port.port_number > 6 {
                true => PortType::Sfp,
                false => PortType::Copper,
            };
            assert_eq!(port.port_type, expected, "port {}", port.port_number);
        }
        assert_eq!(ports[2].linked_camera, Some(DeviceId(7)));
        assert_eq!(ports[7].linked_switch, Some(DeviceId(9)));
    }

    #[tokio::test]
    async fn camera_link_on_sfp_port_is_rejected() {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "devices": [
                    { "id": 1, "name": "sw1", "ip": "10.0.0.2",
                      "class": "switch",
                      "switch": { "snmp_version": "v2c",
                                  "read_community": "public",
                                  "port_count": 4,
                                  "sfp_port_count": 1,
                                  "ports": [
                                    { "number": 4, "linked_camera": 7 }
                                  ] } }
                ]
            }"#,
        )
        .unwrap();
        assert!(MemoryStore::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn layout_update_reassigns_types_and_clears_links() {
        let store = store_with_switch();
        // Shrink to 6 ports with 4 sfp: ports 3..=6 become sfp, so
        // the camera link on port 3 must be cleared with the type
        // change; ports 7 and 8 disappear.
        store
            .update_switch_layout(DeviceId(1), 6, 4)
            .unwrap();
        let ports = store.ports(DeviceId(1)).await.unwrap();
        assert_eq!(ports.len(), 6);
        for port in &ports {
            let expected = match port.port_number > 2 {
                true => PortType::Sfp,
                false => PortType::Copper,
            };
            assert_eq!(port.port_type, expected);
            if port.port_type == PortType::Sfp {
                assert_eq!(port.linked_camera, None);
            } else {
                assert_eq!(port.linked_switch, None);
            }
        }
    }

    #[tokio::test]
    async fn status_update_touches_only_status_fields() {
        let store = store_with_switch();
        store
            .update_status(DeviceId(1), DeviceStatus::Online, Utc::now())
            .await
            .unwrap();
        let device = DeviceStore::get_by_id(&store, DeviceId(1)).await.unwrap();
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.name, "sw1");
        assert!(device.last_check.is_some());
    }
}
