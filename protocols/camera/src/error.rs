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
    #[error("invalid rtsp url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("rtsp url has no host")]
    MissingHost,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("reply carried no RTSP/1.0 token")]
    NotRtsp,
    #[error("probe timed out")]
    Timeout,
}

impl ProbeError for Error {
    fn kind(&self) -> ProbeErrorKind {
        match self {
            Error::Utils(_) | Error::Io(_) => ProbeErrorKind::Transport,
            Error::InvalidUrl(_) | Error::MissingHost => {
                ProbeErrorKind::Config
            }
            Error::NotRtsp => ProbeErrorKind::Protocol,
            Error::Timeout => ProbeErrorKind::Timeout,
        }
    }
}
