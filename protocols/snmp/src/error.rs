/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use thiserror::Error;

use protocol::{ProbeError, ProbeErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Utils(#[from] agent_utils::Error),
    #[error("failed to connect: {0}")]
    Connection(std::io::Error),
    #[error("query failed: {0}")]
    Query(snmp2::Error),
    #[error("request timed out")]
    Timeout,
    #[error("no such object: {0}")]
    NoSuchObject(String),
    #[error("empty response for {0}")]
    EmptyResponse(String),
    #[error("unexpected value for {oid}: expected {expected}")]
    UnexpectedValue {
        oid: String,
        expected: &'static str,
    },
    #[error("invalid oid: {0}")]
    InvalidOid(String),
    #[error("write requested without write community")]
    MissingWriteCommunity,
    #[error("write requested without authPriv credentials")]
    WriteRequiresAuthPriv,
    #[error("incomplete SNMPv3 configuration: missing {0}")]
    MissingUsmParam(&'static str),
    #[error("restart delay below the contractual minimum of 3 s")]
    RestartDelayTooShort,
}

impl Error {
    /// Transport-level failures are retried within the configured
    /// retry count; everything else fails the call immediately.
    pub(crate) fn retryable(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Query(_) | Error::Timeout
        )
    }
}

impl ProbeError for Error {
    fn kind(&self) -> ProbeErrorKind {
        match self {
            Error::Utils(_) | Error::Connection(_) => {
                ProbeErrorKind::Transport
            }
            Error::Query(_) => ProbeErrorKind::Transport,
            Error::Timeout => ProbeErrorKind::Timeout,
            Error::NoSuchObject(_)
            | Error::EmptyResponse(_)
            | Error::UnexpectedValue { .. } => ProbeErrorKind::Protocol,
            Error::InvalidOid(_)
            | Error::MissingWriteCommunity
            | Error::WriteRequiresAuthPriv
            | Error::MissingUsmParam(_)
            | Error::RestartDelayTooShort => ProbeErrorKind::Config,
        }
    }
}
