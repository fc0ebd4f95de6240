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
    #[error("failed to open icmp socket: {0}")]
    Socket(std::io::Error),
    #[error("host did not answer icmp or tcp probes")]
    Unreachable,
    #[error("probe timed out")]
    Timeout,
}

impl ProbeError for Error {
    fn kind(&self) -> ProbeErrorKind {
        match self {
            Error::Utils(_) | Error::Socket(_) => ProbeErrorKind::Transport,
            Error::Unreachable => ProbeErrorKind::Transport,
            Error::Timeout => ProbeErrorKind::Timeout,
        }
    }
}
