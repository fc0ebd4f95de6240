/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of probe failures. Protocol crates keep their
/// own rich error enums; the router only ever branches on the kind.
#[derive(
    Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug,
)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// Required credentials, OIDs or URLs are missing. Never retried.
    Config,
    /// Socket, DNS or network failure. Retried within the attempt's
    /// built-in retry count, then classified as offline.
    Transport,
    /// A per-probe or per-task deadline expired. Offline, no retry in
    /// the same tick.
    Timeout,
    /// SNMP authenticationFailure, HTTP 401/403. Surfaced in
    /// diagnostics; for snapshot probes it still counts as reachable.
    Auth,
    /// Malformed reply (SOAP, ASN.1, RTSP). Offline.
    Protocol,
    /// The probe was cancelled. Propagated, never recorded as status.
    Cancelled,
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config_error"),
            Self::Transport => write!(f, "transport_error"),
            Self::Timeout => write!(f, "timeout"),
            Self::Auth => write!(f, "auth_error"),
            Self::Protocol => write!(f, "protocol_error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Implemented by every protocol crate's error type.
pub trait ProbeError: Error + Send + Sync + 'static {
    fn kind(&self) -> ProbeErrorKind;
}
