/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod client;
mod error;
mod soap;
mod types;

pub use client::{OnvifClient, OnvifConfig, DEVICE_PATH, MEDIA_PATHS};
pub use error::{Error, Result};
pub use types::{DeviceInformation, DiscoveredCamera, Profile};
