/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeviceInformation {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Profile {
    pub token: String,
    pub name: String,
}

/// Everything discovery could learn about a camera. Stream and
/// snapshot URIs have the credentials woven into the URL userinfo so
/// they are directly usable by a player.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiscoveredCamera {
    pub device_info: DeviceInformation,
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub stream_uri: Option<String>,
    #[serde(default)]
    pub snapshot_uri: Option<String>,
}
