/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod error;
mod prober;
mod rtsp;

pub use error::{Error, Result};
pub use prober::{CameraProbe, CameraProber, CameraReport};
pub use rtsp::rtsp_options_check;
