/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod client;
mod config;
mod error;
mod oid;
mod tfortis;
mod value;

pub use client::SnmpClient;
pub use config::{SnmpAuth, SnmpConfig, TimingConfig};
pub use error::{Error, Result};
pub use oid::{oid_starts_with, oid_suffix, parse_oid, table_oid};
pub use tfortis::{
    format_speed, AutoRestart, IfOperStatus, PoeInfo, PortInfo, SystemInfo,
    TFortisSwitch, UpsInfo, POE_RESTART_DELAY,
};
pub use value::SnmpValue;
