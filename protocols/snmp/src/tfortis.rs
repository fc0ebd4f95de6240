/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::SnmpClient;
use crate::error::{Error, Result};
use crate::oid::{oid_suffix, parse_oid, table_oid};
use crate::value::SnmpValue;

/* Standard MIB-2 columns. */

const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";
const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
const IF_ADMIN_STATUS: &str = "1.3.6.1.2.1.2.2.1.7";
const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";
const IF_IN_OCTETS: &str = "1.3.6.1.2.1.2.2.1.10";
const IF_OUT_OCTETS: &str = "1.3.6.1.2.1.2.2.1.16";

/* TFortis enterprise subtree (.1.3.6.1.4.1.42019). */

const TF_POE_CONFIG: &str = "1.3.6.1.4.1.42019.3.2.1.3.1.1.2";
const TF_POE_STATUS: &str = "1.3.6.1.4.1.42019.3.2.2.5.1.1.2";
const TF_POE_POWER: &str = "1.3.6.1.4.1.42019.3.2.2.5.1.1.3";
const TF_AUTORESTART_MODE: &str = "1.3.6.1.4.1.42019.3.2.1.2.1.1.2";
const TF_AUTORESTART_PING_IP: &str = "1.3.6.1.4.1.42019.3.2.1.2.1.1.3";
const TF_AUTORESTART_SPEED: &str = "1.3.6.1.4.1.42019.3.2.1.2.1.1.4";
const TF_AUTORESTART_STATUS: &str = "1.3.6.1.4.1.42019.3.2.1.2.1.1.5";
const TF_FIRMWARE: &str = "1.3.6.1.4.1.42019.3.2.2.3.1.0";
const TF_UPS_STATUS: &str = "1.3.6.1.4.1.42019.3.2.2.1.2.0";
const TF_UPS_CHARGE: &str = "1.3.6.1.4.1.42019.3.2.2.1.3.0";

/* Vendor enum values. Note the reversed PoE encoding: 1 = enabled,
 * 2 = disabled (and 1 = power delivered, 2 = no power for the actual
 * status column). */

const POE_ENABLED: i64 = 1;
const POE_DISABLED: i64 = 2;
const POE_ACTUAL_UP: i64 = 1;
const ADMIN_UP: i64 = 1;
const ADMIN_DOWN: i64 = 2;

/// Contractual minimum off-time for PoE / admin-status restarts.
pub const POE_RESTART_DELAY: Duration = Duration::from_secs(3);

#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum IfOperStatus {
    Up,
    Down,
    Testing,
    Unknown,
}

impl IfOperStatus {
    pub fn decode(value: i64) -> Self {
        match value {
            1 => Self::Up,
            2 => Self::Down,
            3 => Self::Testing,
            _ => Self::Unknown,
        }
    }
}

impl From<IfOperStatus> for device_base::PortStatus {
    fn from(status: IfOperStatus) -> Self {
        match status {
            IfOperStatus::Up => device_base::PortStatus::Up,
            IfOperStatus::Down => device_base::PortStatus::Down,
            IfOperStatus::Testing | IfOperStatus::Unknown => {
                device_base::PortStatus::Unknown
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SystemInfo {
    pub firmware: String,
    pub ups: Option<UpsInfo>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct UpsInfo {
    pub status: i64,
    pub charge_pct: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PortInfo {
    pub port: u32,
    pub status: IfOperStatus,
    pub speed_bps: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub descr: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct PoeInfo {
    pub config_enabled: bool,
    pub actual_up: bool,
    pub power_mw: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AutoRestart {
    pub mode: u8,
    pub ping_ip: Option<Ipv4Addr>,
    pub link_speed: Option<u64>,
    pub status: Option<i64>,
}

/// Typed facade over the SNMP transport for TFortis managed switches.
/// Vendor specificity is a set of OID constants plus decoders, not a
/// different client.
pub struct TFortisSwitch {
    client: SnmpClient,
}

impl TFortisSwitch {
    pub fn new(client: SnmpClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SnmpClient {
        &self.client
    }

    /// Single GET on sysUpTime; proves the agent answers with the
    /// configured credentials.
    pub async fn test_connection(&self) -> Result<()> {
        self.client.get(&parse_oid(SYS_UPTIME)?).await.map(|_| ())
    }

    pub async fn get_system_info(&self) -> Result<SystemInfo> {
        let firmware = self
            .client
            .get(&parse_oid(TF_FIRMWARE)?)
            .await?
            .as_str()
            .map(str::to_owned)
            .ok_or(Error::UnexpectedValue {
                oid: TF_FIRMWARE.into(),
                expected: "string",
            })?;

        // The UPS block is optional hardware; absent OIDs are not an
        // error.
        let ups = match self
            .client
            .get_multi(&[
                parse_oid(TF_UPS_STATUS)?,
                parse_oid(TF_UPS_CHARGE)?,
            ])
            .await
        {
            Ok(values) => match (
                values.first().cloned().flatten(),
                values.get(1).cloned().flatten(),
            ) {
                (Some(status), Some(charge)) => status
                    .as_i64()
                    .zip(charge.as_i64())
                    .map(|(status, charge_pct)| UpsInfo {
                        status,
                        charge_pct,
                    }),
                _ => None,
            },
            Err(Error::NoSuchObject(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(SystemInfo { firmware, ups })
    }

    pub async fn get_port_info(&self, port: u32) -> Result<PortInfo> {
        let values = self
            .client
            .get_multi(&[
                table_oid(IF_OPER_STATUS, port)?,
                table_oid(IF_SPEED, port)?,
                table_oid(IF_IN_OCTETS, port)?,
                table_oid(IF_OUT_OCTETS, port)?,
                table_oid(IF_DESCR, port)?,
            ])
            .await?;

        let int_at = |i: usize| -> Option<i64> {
            values.get(i).cloned().flatten().and_then(|v| v.as_i64())
        };
        let uint_at = |i: usize| -> u64 {
            values
                .get(i)
                .cloned()
                .flatten()
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
        };

        Ok(PortInfo {
            port,
            status: int_at(0)
                .map(IfOperStatus::decode)
                .unwrap_or(IfOperStatus::Unknown),
            speed_bps: uint_at(1),
            rx_bytes: uint_at(2),
            tx_bytes: uint_at(3),
            descr: values
                .get(4)
                .cloned()
                .flatten()
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default(),
        })
    }

    pub async fn get_all_ports(&self, count: u32) -> Result<Vec<PortInfo>> {
        let mut ports = Vec::with_capacity(count as usize);
        for port in 1..=count {
            ports.push(self.get_port_info(port).await?);
        }
        Ok(ports)
    }

    /// Walk ifOperStatus and return `port -> status`, capped at
    /// `count` ports; interfaces beyond the physical ports are
    /// ignored.
    pub async fn walk_oper_status(
        &self,
        count: u32,
    ) -> Result<BTreeMap<u32, IfOperStatus>> {
        let root = parse_oid(IF_OPER_STATUS)?;
        let mut statuses = BTreeMap::new();
        self.client
            .walk(&root, |oid, value| {
                let Some(index) = oid_suffix(oid, &root)
                    .and_then(|suffix| suffix.first().copied())
                else {
                    return true;
                };
                let Ok(port) = u32::try_from(index) else {
                    return true;
                };
                if port > count {
                    return false;
                }
                if let Some(status) = value.as_i64() {
                    statuses.insert(port, IfOperStatus::decode(status));
                }
                true
            })
            .await?;
        Ok(statuses)
    }

    pub async fn get_poe_info(&self, port: u32) -> Result<PoeInfo> {
        let values = self
            .client
            .get_multi(&[
                table_oid(TF_POE_CONFIG, port)?,
                table_oid(TF_POE_STATUS, port)?,
                table_oid(TF_POE_POWER, port)?,
            ])
            .await?;
        let int_at = |i: usize| -> Option<i64> {
            values.get(i).cloned().flatten().and_then(|v| v.as_i64())
        };
        Ok(PoeInfo {
            config_enabled: int_at(0) == Some(POE_ENABLED),
            actual_up: int_at(1) == Some(POE_ACTUAL_UP),
            power_mw: values
                .get(2)
                .cloned()
                .flatten()
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        })
    }

    pub async fn set_poe_enabled(
        &self,
        port: u32,
        enabled: bool,
    ) -> Result<()> {
        let value = if enabled { POE_ENABLED } else { POE_DISABLED };
        log::debug!(
            "SNMP: set PoE port {} to {}",
            port,
            if enabled { "enabled" } else { "disabled" }
        );
        self.client
            .set(&table_oid(TF_POE_CONFIG, port)?, SnmpValue::Int(value))
            .await
    }

    pub async fn set_port_admin_enabled(
        &self,
        port: u32,
        enabled: bool,
    ) -> Result<()> {
        let value = if enabled { ADMIN_UP } else { ADMIN_DOWN };
        log::debug!(
            "SNMP: set ifAdminStatus port {} to {}",
            port,
            value
        );
        self.client
            .set(&table_oid(IF_ADMIN_STATUS, port)?, SnmpValue::Int(value))
            .await
    }

    pub async fn get_auto_restart(&self, port: u32) -> Result<AutoRestart> {
        let values = self
            .client
            .get_multi(&[
                table_oid(TF_AUTORESTART_MODE, port)?,
                table_oid(TF_AUTORESTART_PING_IP, port)?,
                table_oid(TF_AUTORESTART_SPEED, port)?,
                table_oid(TF_AUTORESTART_STATUS, port)?,
            ])
            .await?;
        let mode = values
            .first()
            .cloned()
            .flatten()
            .and_then(|v| v.as_i64())
            .and_then(|v| u8::try_from(v).ok())
            .ok_or(Error::UnexpectedValue {
                oid: TF_AUTORESTART_MODE.into(),
                expected: "integer 0..4",
            })?;
        Ok(AutoRestart {
            mode,
            ping_ip: values
                .get(1)
                .cloned()
                .flatten()
                .and_then(|v| v.as_ipaddr()),
            link_speed: values
                .get(2)
                .cloned()
                .flatten()
                .and_then(|v| v.as_u64()),
            status: values
                .get(3)
                .cloned()
                .flatten()
                .and_then(|v| v.as_i64()),
        })
    }

    pub async fn set_auto_restart_mode(
        &self,
        port: u32,
        mode: u8,
    ) -> Result<()> {
        self.client
            .set(
                &table_oid(TF_AUTORESTART_MODE, port)?,
                SnmpValue::Int(i64::from(mode)),
            )
            .await
    }

    /// Power-cycle a PoE port: disable, hold for `delay`, re-enable.
    /// Delays below the contractual 3-second minimum are rejected.
    pub async fn restart_poe(&self, port: u32, delay: Duration) -> Result<()> {
        if delay < POE_RESTART_DELAY {
            return Err(Error::RestartDelayTooShort);
        }
        self.set_poe_enabled(port, false).await?;
        tokio::time::sleep(delay).await;
        self.set_poe_enabled(port, true).await
    }

    /// Bounce a port administratively, with the same minimum
    /// off-time as a PoE restart.
    pub async fn restart_port(
        &self,
        port: u32,
        delay: Duration,
    ) -> Result<()> {
        if delay < POE_RESTART_DELAY {
            return Err(Error::RestartDelayTooShort);
        }
        self.set_port_admin_enabled(port, false).await?;
        tokio::time::sleep(delay).await;
        self.set_port_admin_enabled(port, true).await
    }
}

/// Human-readable link speed.
pub fn format_speed(bps: u64) -> String {
    fn scaled(value: u64, unit: u64) -> String {
        let scaled = value as f64 / unit as f64;
        if (scaled - scaled.trunc()).abs() < 1e-9 {
            format!("{}", scaled as u64)
        } else {
            format!("{:.1}", scaled)
        }
    }
    match bps {
        0 => String::from("0 bit/s"),
        b if b >= 1_000_000_000 => {
            format!("{} Gbit/s", scaled(b, 1_000_000_000))
        }
        b if b >= 1_000_000 => format!("{} Mbit/s", scaled(b, 1_000_000)),
        b if b >= 1_000 => format!("{} Kbit/s", scaled(b, 1_000)),
        b => format!("{} bit/s", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oper_status_decoding() {
        assert_eq!(IfOperStatus::decode(1), IfOperStatus::Up);
        assert_eq!(IfOperStatus::decode(2), IfOperStatus::Down);
        assert_eq!(IfOperStatus::decode(3), IfOperStatus::Testing);
        assert_eq!(IfOperStatus::decode(7), IfOperStatus::Unknown);
    }

    #[test]
    fn poe_encoding_is_reversed() {
        // 1 = enabled, 2 = disabled; the naive guess is the inverse.
        assert_eq!(POE_ENABLED, 1);
        assert_eq!(POE_DISABLED, 2);
    }

    #[test]
    fn poe_write_oids() {
        assert_eq!(
            table_oid(TF_POE_CONFIG, 3).unwrap().to_string(),
            "1.3.6.1.4.1.42019.3.2.1.3.1.1.2.3"
        );
        assert_eq!(
            table_oid(TF_POE_STATUS, 3).unwrap().to_string(),
            "1.3.6.1.4.1.42019.3.2.2.5.1.1.2.3"
        );
        assert_eq!(
            table_oid(TF_POE_POWER, 3).unwrap().to_string(),
            "1.3.6.1.4.1.42019.3.2.2.5.1.1.3.3"
        );
    }

    #[test]
    fn speed_formatting() {
        assert_eq!(format_speed(1_000_000_000), "1 Gbit/s");
        assert_eq!(format_speed(2_500_000_000), "2.5 Gbit/s");
        assert_eq!(format_speed(100_000_000), "100 Mbit/s");
        assert_eq!(format_speed(10_000), "10 Kbit/s");
        assert_eq!(format_speed(500), "500 bit/s");
        assert_eq!(format_speed(0), "0 bit/s");
    }

    #[tokio::test]
    async fn restart_rejects_short_delay() {
        use crate::config::{SnmpAuth, SnmpConfig};
        use device_base::SnmpVersion;

        let switch = TFortisSwitch::new(SnmpClient::new(SnmpConfig::new(
            "127.0.0.1",
            SnmpAuth::Community {
                version: SnmpVersion::V2c,
                read: "public".into(),
                write: Some("private".into()),
            },
        )));
        assert!(matches!(
            switch.restart_poe(1, Duration::from_secs(1)).await,
            Err(Error::RestartDelayTooShort)
        ));
        assert!(matches!(
            switch.restart_port(1, Duration::from_millis(2999)).await,
            Err(Error::RestartDelayTooShort)
        ));
    }
}
