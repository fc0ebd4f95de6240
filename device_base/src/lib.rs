/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod device;
mod error;
mod event;
mod ids;
mod notify;
mod store;

pub use device::{
    AuthProtocol, CameraConfig, Credential, Device, DeviceClass, DeviceStatus,
    PortStatus, PortType, PrivProtocol, SecurityLevel, ServerConfig,
    SnmpVersion, SwitchConfig, SwitchPort, UsmConfig,
};
pub use error::{Error, Result};
pub use event::{Event, EventLevel, EventType, NewEvent, StatusHistory};
pub use ids::{CredentialId, DeviceId, EventId, HistoryId, PortId};
pub use notify::{topics, Notifier};
pub use store::{CredentialStore, DeviceStore, EventStore, HistoryStore};
