/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CredentialId, DeviceId, PortId};

/// A registered device. The monitoring engine only ever writes back
/// `status` and `last_check`; everything else belongs to the catalog.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub ip: String,
    pub class: DeviceClass,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub credential_id: Option<CredentialId>,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Switch,
    Server,
    Camera,
    /// Catalog rows with a class this build does not know keep
    /// working with plain reachability checks.
    #[serde(other)]
    Other,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => write!(f, "switch"),
            Self::Server => write!(f, "server"),
            Self::Camera => write!(f, "camera"),
            Self::Other => write!(f, "unknown"),
        }
    }
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// SNMP access parameters for a managed switch.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SwitchConfig {
    pub device_id: DeviceId,
    pub snmp_version: SnmpVersion,
    pub read_community: String,
    #[serde(default)]
    pub write_community: Option<String>,
    #[serde(default)]
    pub usm: Option<UsmConfig>,
    pub port_count: u32,
    #[serde(default)]
    pub sfp_port_count: u32,
    #[serde(default)]
    pub uplink_port: Option<u32>,
}

/// SNMPv3 user-based security parameters.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UsmConfig {
    pub user: String,
    pub level: SecurityLevel,
    #[serde(default)]
    pub auth_protocol: Option<AuthProtocol>,
    #[serde(default)]
    pub auth_key: Option<String>,
    #[serde(default)]
    pub priv_protocol: Option<PrivProtocol>,
    #[serde(default)]
    pub priv_key: Option<String>,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum SnmpVersion {
    V1,
    V2c,
    V3,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthProtocol {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum PrivProtocol {
    Des,
    Aes128,
    Aes192,
    Aes256,
}

/// A physical switch port. Invariant: `port_type == Sfp` iff
/// `port_number > port_count - sfp_port_count` of the owning switch; a
/// camera link requires a copper port, a switch/server uplink an sfp port.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SwitchPort {
    pub id: PortId,
    pub device_id: DeviceId,
    pub port_number: u32,
    pub name: String,
    #[serde(default)]
    pub status: PortStatus,
    #[serde(default)]
    pub speed_bps: Option<u64>,
    pub port_type: PortType,
    #[serde(default)]
    pub linked_camera: Option<DeviceId>,
    #[serde(default)]
    pub linked_switch: Option<DeviceId>,
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    Copper,
    Sfp,
}

/// Camera access parameters. `rtsp_url` is stored encrypted.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CameraConfig {
    pub device_id: DeviceId,
    #[serde(default)]
    pub rtsp_url: Option<String>,
    #[serde(default)]
    pub onvif_port: Option<u16>,
    #[serde(default)]
    pub snapshot_url: Option<String>,
    #[serde(default)]
    pub stream_type: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub device_id: DeviceId,
    #[serde(default)]
    pub tcp_ports: Vec<u16>,
    #[serde(default)]
    pub uplink_port: Option<u32>,
}

/// A credential vault entry. `username` and `password` are stored
/// encrypted; decryption happens in the vault, not here.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credential {
    pub id: CredentialId,
    pub name: String,
    pub kind: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub note: Option<String>,
}
