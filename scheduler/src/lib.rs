/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod config;
mod engine;
mod error;
mod pool;
mod reconcile;
mod router;
mod sink;
#[cfg(test)]
pub(crate) mod testutil;

pub use config::MonitorConfig;
pub use engine::{MonitorStatus, Scheduler};
pub use error::{Error, Result};
pub use pool::{
    ProbeOutcome, ProbeTask, ResultHandler, TaskSubmitter, WorkerPool,
    QUEUE_CAPACITY, TASK_TIMEOUT,
};
pub use reconcile::reconcile_ports;
pub use router::ProbeRouter;
pub use sink::EventSink;
