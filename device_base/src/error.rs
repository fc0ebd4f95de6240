/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use thiserror::Error;

use crate::ids::{CredentialId, DeviceId, PortId};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by store implementations. The engine logs and
/// swallows these in the sink; elsewhere they propagate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),
    #[error("port {0} not found")]
    PortNotFound(PortId),
    #[error("credential {0} not found")]
    CredentialNotFound(CredentialId),
    #[error("store backend error: {0}")]
    Backend(String),
}
