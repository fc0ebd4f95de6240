/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use device_base::{
    CameraConfig, Credential, CredentialId, CredentialStore, Device,
    DeviceClass, DeviceId, DeviceStatus, DeviceStore, Error, EventStore,
    HistoryStore, NewEvent, Notifier, PortId, PortStatus, Result,
    ServerConfig, SwitchConfig, SwitchPort,
};

/// In-memory world for engine tests: every store trait plus a
/// recording notifier, with switchable failure injection for the
/// sink paths.
#[derive(Default)]
pub(crate) struct FakeWorld {
    pub devices: Mutex<HashMap<i64, Device>>,
    pub switch_configs: Mutex<HashMap<i64, SwitchConfig>>,
    pub camera_configs: Mutex<HashMap<i64, CameraConfig>>,
    pub server_configs: Mutex<HashMap<i64, ServerConfig>>,
    pub ports: Mutex<Vec<SwitchPort>>,
    pub credentials: Mutex<HashMap<i64, Credential>>,
    pub history: Mutex<Vec<(DeviceId, DeviceStatus, f64)>>,
    pub events: Mutex<Vec<NewEvent>>,
    pub notifications: Mutex<Vec<(String, serde_json::Value)>>,
    pub fail_history: AtomicBool,
    pub fail_events: AtomicBool,
}

impl FakeWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_device(
        self: &Arc<Self>,
        id: i64,
        class: DeviceClass,
        status: DeviceStatus,
    ) {
        self.devices.lock().insert(
            id,
            Device {
                id: DeviceId(id),
                name: format!("device-{}", id),
                ip: "192.0.2.1".into(),
                class,
                status,
                last_check: None,
                credential_id: None,
            },
        );
    }

    pub fn add_port(
        self: &Arc<Self>,
        id: i64,
        device: i64,
        number: u32,
        status: PortStatus,
    ) {
        self.ports.lock().push(SwitchPort {
            id: PortId(id),
            device_id: DeviceId(device),
            port_number: number,
            name: format!("Port {}", number),
            status,
            speed_bps: None,
            port_type: device_base::PortType::Copper,
            linked_camera: None,
            linked_switch: None,
        });
    }
}

#[async_trait]
impl DeviceStore for FakeWorld {
    async fn get_all(&self) -> Result<Vec<Device>> {
        Ok(self.devices.lock().values().cloned().collect())
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Device> {
        self.devices
            .lock()
            .get(&id.0)
            .cloned()
            .ok_or(Error::DeviceNotFound(id))
    }

    async fn get_by_class(
        &self,
        class: DeviceClass,
    ) -> Result<Vec<Device>> {
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
    ) -> Result<()> {
        let mut devices = self.devices.lock();
        let device =
            devices.get_mut(&id.0).ok_or(Error::DeviceNotFound(id))?;
        device.status = status;
        device.last_check = Some(last_check);
        Ok(())
    }

    async fn switch_config(
        &self,
        id: DeviceId,
    ) -> Result<Option<SwitchConfig>> {
        Ok(self.switch_configs.lock().get(&id.0).cloned())
    }

    async fn camera_config(
        &self,
        id: DeviceId,
    ) -> Result<Option<CameraConfig>> {
        Ok(self.camera_configs.lock().get(&id.0).cloned())
    }

    async fn server_config(
        &self,
        id: DeviceId,
    ) -> Result<Option<ServerConfig>> {
        Ok(self.server_configs.lock().get(&id.0).cloned())
    }

    async fn ports(&self, id: DeviceId) -> Result<Vec<SwitchPort>> {
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
    ) -> Result<()> {
        let mut ports = self.ports.lock();
        let port = ports
            .iter_mut()
            .find(|port| port.id == id)
            .ok_or(Error::PortNotFound(id))?;
        port.status = status;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FakeWorld {
    async fn record(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        latency_ms: f64,
    ) -> Result<()> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Error::Backend("history store down".into()));
        }
        self.history.lock().push((device_id, status, latency_ms));
        Ok(())
    }
}

#[async_trait]
impl EventStore for FakeWorld {
    async fn create(&self, event: NewEvent) -> Result<()> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(Error::Backend("event store down".into()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FakeWorld {
    async fn get_by_id(&self, id: CredentialId) -> Result<Credential> {
        self.credentials
            .lock()
            .get(&id.0)
            .cloned()
            .ok_or(Error::CredentialNotFound(id))
    }
}

impl Notifier for FakeWorld {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.notifications
            .lock()
            .push((topic.to_string(), payload));
    }
}

pub(crate) fn sink_for(world: &Arc<FakeWorld>) -> Arc<crate::EventSink> {
    Arc::new(crate::EventSink::new(
        world.clone(),
        world.clone(),
        world.clone(),
    ))
}
