/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use device_base::{
    CredentialId, DeviceClass, SecurityLevel, SnmpVersion, UsmConfig,
};
use scheduler::MonitorConfig;

use crate::error::{Error, Result};

/// The agent's config file: monitoring knobs plus the registered
/// device catalog. Devices are explicitly registered here; there is
/// no discovery.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AgentConfig {
    #[serde(default)]
    pub monitoring: MonitorConfig,
    #[serde(default = "default_key_file")]
    pub master_key_file: PathBuf,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

fn default_key_file() -> PathBuf {
    PathBuf::from("netwatch.key")
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeviceEntry {
    pub id: i64,
    pub name: String,
    pub ip: String,
    pub class: DeviceClass,
    #[serde(default)]
    pub credential_id: Option<CredentialId>,
    #[serde(default)]
    pub switch: Option<SwitchEntry>,
    #[serde(default)]
    pub camera: Option<CameraEntry>,
    #[serde(default)]
    pub server: Option<ServerEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SwitchEntry {
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
    /// Per-port overrides: names and camera/uplink links.
    #[serde(default)]
    pub ports: Vec<PortEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PortEntry {
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub linked_camera: Option<i64>,
    #[serde(default)]
    pub linked_switch: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CameraEntry {
    /// Stored encrypted under the master key, like the rest of the
    /// catalog at rest.
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
pub struct ServerEntry {
    #[serde(default)]
    pub tcp_ports: Vec<u16>,
    #[serde(default)]
    pub uplink_port: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CredentialEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Encrypted.
    pub username: String,
    /// Encrypted.
    pub password: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ReadConfig(path.to_path_buf(), e))?;
        let config: AgentConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::ParseConfig(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for device in &self.devices {
            if device.class == DeviceClass::Switch {
                let Some(switch) = &device.switch else {
                    continue;
                };
                if switch.sfp_port_count > switch.port_count {
                    return Err(Error::InvalidDevice(
                        device.name.clone(),
                        String::from(
                            "sfp_port_count exceeds port_count",
                        ),
                    ));
                }
                if switch.snmp_version == SnmpVersion::V3 {
                    let Some(usm) = &switch.usm else {
                        return Err(Error::InvalidDevice(
                            device.name.clone(),
                            String::from("v3 requires a usm block"),
                        ));
                    };
                    if usm.level != SecurityLevel::NoAuthNoPriv
                        && usm.auth_protocol.is_none()
                    {
                        return Err(Error::InvalidDevice(
                            device.name.clone(),
                            String::from(
                                "usm level requires an auth protocol",
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses() {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "devices": [
                    { "id": 1, "name": "sw1", "ip": "10.0.0.2",
                      "class": "switch",
                      "switch": { "snmp_version": "v2c",
                                  "read_community": "public",
                                  "port_count": 8,
                                  "sfp_port_count": 2 } },
                    { "id": 2, "name": "srv1", "ip": "10.0.0.3",
                      "class": "server",
                      "server": { "tcp_ports": [22, 443] } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.monitoring.interval, 30.0);
        assert_eq!(config.monitoring.workers, 10);
        assert_eq!(config.devices.len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn v3_switch_without_usm_is_rejected() {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "devices": [
                    { "id": 1, "name": "sw1", "ip": "10.0.0.2",
                      "class": "switch",
                      "switch": { "snmp_version": "v3",
                                  "read_community": "",
                                  "port_count": 8 } }
                ]
            }"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_class_falls_back() {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "devices": [
                    { "id": 1, "name": "x", "ip": "10.0.0.9",
                      "class": "printer" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.devices[0].class, DeviceClass::Other);
    }
}
