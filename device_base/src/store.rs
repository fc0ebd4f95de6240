/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::device::{
    CameraConfig, Credential, Device, DeviceClass, DeviceStatus,
    PortStatus, ServerConfig, SwitchConfig, SwitchPort,
};
use crate::error::Result;
use crate::event::NewEvent;
use crate::ids::{CredentialId, DeviceId, PortId};

/* Repository interfaces consumed by the monitoring engine. The engine
 * relies on per-row atomic updates and holds no multi-row locks. */

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Device>>;
    async fn get_by_id(&self, id: DeviceId) -> Result<Device>;
    async fn get_by_class(&self, class: DeviceClass) -> Result<Vec<Device>>;

    /// The only device-row mutation the engine performs.
    async fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        last_check: DateTime<Utc>,
    ) -> Result<()>;

    async fn switch_config(&self, id: DeviceId)
        -> Result<Option<SwitchConfig>>;
    async fn camera_config(&self, id: DeviceId)
        -> Result<Option<CameraConfig>>;
    async fn server_config(&self, id: DeviceId)
        -> Result<Option<ServerConfig>>;

    async fn ports(&self, id: DeviceId) -> Result<Vec<SwitchPort>>;
    async fn update_port_status(
        &self,
        id: PortId,
        status: PortStatus,
    ) -> Result<()>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        latency_ms: f64,
    ) -> Result<()>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<()>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the row as stored; username and password are still
    /// encrypted at this point.
    async fn get_by_id(&self, id: CredentialId) -> Result<Credential>;
}
