/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod config;
mod error;
mod icmp;
mod tcp;

pub use config::PingConfig;
pub use error::{Error, Result};
pub use icmp::{PingResult, Pinger};
pub use tcp::{connect_any, connect_one, FALLBACK_PORTS};
