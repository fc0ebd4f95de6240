/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod error;
mod report;

pub use error::{ProbeError, ProbeErrorKind};
pub use report::ProbeReport;
