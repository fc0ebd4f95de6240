/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

use device_base::{
    AuthProtocol, PrivProtocol, SecurityLevel, SnmpVersion, SwitchConfig,
};

use crate::error::{Error, Result};

/* Config */

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SnmpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub auth: SnmpAuth,
    #[serde(default)]
    pub timing: TimingConfig,
}

const fn default_port() -> u16 {
    161
}

impl SnmpConfig {
    pub fn new(host: impl Into<String>, auth: SnmpAuth) -> Self {
        SnmpConfig {
            host: host.into(),
            port: default_port(),
            auth,
            timing: TimingConfig::default(),
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SnmpAuth {
    Community {
        version: SnmpVersion,
        read: String,
        #[serde(default)]
        write: Option<String>,
    },
    Usm {
        user: String,
        level: SecurityLevel,
        #[serde(default)]
        auth: Option<(AuthProtocol, String)>,
        #[serde(default)]
        privacy: Option<(PrivProtocol, String)>,
    },
}

impl SnmpAuth {
    /// Build the authentication parameters from a stored switch
    /// config, validating that the fields the chosen version needs
    /// are present.
    pub fn from_switch(config: &SwitchConfig) -> Result<Self> {
        match config.snmp_version {
            SnmpVersion::V1 | SnmpVersion::V2c => Ok(SnmpAuth::Community {
                version: config.snmp_version,
                read: config.read_community.clone(),
                write: config.write_community.clone(),
            }),
            SnmpVersion::V3 => {
                let usm = config
                    .usm
                    .as_ref()
                    .ok_or(Error::MissingUsmParam("usm block"))?;
                let auth = match usm.level {
                    SecurityLevel::NoAuthNoPriv => None,
                    SecurityLevel::AuthNoPriv | SecurityLevel::AuthPriv => {
                        let proto = usm
                            .auth_protocol
                            .ok_or(Error::MissingUsmParam("auth_protocol"))?;
                        let key = usm
                            .auth_key
                            .clone()
                            .ok_or(Error::MissingUsmParam("auth_key"))?;
                        Some((proto, key))
                    }
                };
                let privacy = match usm.level {
                    SecurityLevel::AuthPriv => {
                        let proto = usm
                            .priv_protocol
                            .ok_or(Error::MissingUsmParam("priv_protocol"))?;
                        let key = usm
                            .priv_key
                            .clone()
                            .ok_or(Error::MissingUsmParam("priv_key"))?;
                        Some((proto, key))
                    }
                    _ => None,
                };
                Ok(SnmpAuth::Usm {
                    user: usm.user.clone(),
                    level: usm.level,
                    auth,
                    privacy,
                })
            }
        }
    }

    /// Whether `set` is allowed with these credentials: a write
    /// community for v1/v2c, authPriv for v3.
    pub fn writable(&self) -> bool {
        match self {
            SnmpAuth::Community { write, .. } => write.is_some(),
            SnmpAuth::Usm { level, .. } => {
                *level == SecurityLevel::AuthPriv
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct TimingConfig {
    pub retries: u64,
    pub timeout: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            retries: 2,
            timeout: 5.0,
        }
    }
}

impl TimingConfig {
    pub(crate) fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_base::{DeviceId, UsmConfig};

    fn switch_config(version: SnmpVersion) -> SwitchConfig {
        SwitchConfig {
            device_id: DeviceId(1),
            snmp_version: version,
            read_community: "public".into(),
            write_community: None,
            usm: None,
            port_count: 8,
            sfp_port_count: 2,
            uplink_port: None,
        }
    }

    #[test]
    fn community_from_switch() {
        let auth = SnmpAuth::from_switch(&switch_config(SnmpVersion::V2c))
            .unwrap();
        assert!(matches!(
            auth,
            SnmpAuth::Community { version: SnmpVersion::V2c, .. }
        ));
        assert!(!auth.writable());
    }

    #[test]
    fn v3_requires_usm_block() {
        let err = SnmpAuth::from_switch(&switch_config(SnmpVersion::V3))
            .unwrap_err();
        assert!(matches!(err, Error::MissingUsmParam(_)));
    }

    #[test]
    fn v3_auth_priv_is_writable() {
        let mut config = switch_config(SnmpVersion::V3);
        config.usm = Some(UsmConfig {
            user: "monitor".into(),
            level: SecurityLevel::AuthPriv,
            auth_protocol: Some(AuthProtocol::Sha256),
            auth_key: Some("p1".into()),
            priv_protocol: Some(PrivProtocol::Aes128),
            priv_key: Some("p2".into()),
        });
        let auth = SnmpAuth::from_switch(&config).unwrap();
        assert!(auth.writable());
    }

    #[test]
    fn v3_auth_priv_missing_priv_key() {
        let mut config = switch_config(SnmpVersion::V3);
        config.usm = Some(UsmConfig {
            user: "monitor".into(),
            level: SecurityLevel::AuthPriv,
            auth_protocol: Some(AuthProtocol::Sha256),
            auth_key: Some("p1".into()),
            priv_protocol: Some(PrivProtocol::Aes128),
            priv_key: None,
        });
        assert!(matches!(
            SnmpAuth::from_switch(&config),
            Err(Error::MissingUsmParam("priv_key"))
        ));
    }
}
