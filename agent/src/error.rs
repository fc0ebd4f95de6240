/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read config {0}: {1}")]
    ReadConfig(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config {0}: {1}")]
    ParseConfig(PathBuf, #[source] serde_json::Error),
    #[error("device {0}: {1}")]
    InvalidDevice(String, String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Utils(#[from] agent_utils::Error),
    #[error("{0}")]
    Store(#[from] device_base::Error),
    #[error("SNMP error: {0}")]
    Snmp(#[from] snmp_protocol::Error),
    #[error("ONVIF error: {0}")]
    Onvif(#[from] onvif_protocol::Error),
}
