/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use thiserror::Error;

use protocol::{ProbeError, ProbeErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to camera failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("camera returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("XML could not be parsed: {0}")]
    Xml(#[from] minidom::Error),
    #[error("element {0} not present in reply")]
    MissingElement(&'static str),
    #[error("camera returned an invalid uri: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("no media endpoint answered")]
    NoMediaEndpoint,
}

impl ProbeError for Error {
    fn kind(&self) -> ProbeErrorKind {
        match self {
            Error::Request(e) if e.is_timeout() => ProbeErrorKind::Timeout,
            Error::Request(_) => ProbeErrorKind::Transport,
            Error::Http { status: 401 | 403, .. } => ProbeErrorKind::Auth,
            Error::Http { .. }
            | Error::Xml(_)
            | Error::MissingElement(_)
            | Error::InvalidUri(_)
            | Error::NoMediaEndpoint => ProbeErrorKind::Protocol,
        }
    }
}
