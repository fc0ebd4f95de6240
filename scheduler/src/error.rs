/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::{convert, error, fmt};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tokio error: {0}")]
    Tokio(#[from] Box<dyn error::Error + Sync + Send + 'static>),
    #[error("Tokio error: {0}")]
    TokioJoin(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Store(#[from] device_base::Error),
    #[error("timeout")]
    Timeout,
}

impl<T> convert::From<tokio::sync::mpsc::error::SendError<T>> for Error
where
    T: fmt::Debug + Send + Sync + 'static,
{
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Error {
        Error::Tokio(Box::new(err))
    }
}

impl<T> convert::From<tokio::sync::watch::error::SendError<T>> for Error
where
    T: fmt::Debug + Send + Sync + 'static,
{
    fn from(err: tokio::sync::watch::error::SendError<T>) -> Error {
        Error::Tokio(Box::new(err))
    }
}
