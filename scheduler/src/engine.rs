/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use device_base::{
    topics, DeviceStatus, DeviceStore, EventLevel, EventType, NewEvent,
    Notifier,
};

use crate::config::MonitorConfig;
use crate::pool::{
    ProbeOutcome, ProbeTask, ResultHandler, TaskSubmitter, WorkerPool,
};
use crate::router::ProbeRouter;
use crate::sink::EventSink;

/// Drain delay after a one-shot fan-out on a temporarily started
/// pool.
const RUN_ONCE_DRAIN: Duration = Duration::from_millis(500);

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct MonitorStatus {
    pub running: bool,
    pub interval: f64,
    pub ping_timeout: f64,
    pub snmp_timeout: f64,
    pub workers: usize,
}

struct Running {
    pool: WorkerPool,
    submitter: TaskSubmitter,
    ticker: JoinHandle<()>,
    stop_sender: watch::Sender<bool>,
    interval_sender: watch::Sender<Duration>,
}

/// The periodic monitoring engine. `Stopped` until `start`, which
/// builds a fresh pool, stop root and tick loop; `stop` tears all of
/// it down again. A stopped scheduler restarts cleanly; nothing is
/// reused between runs.
pub struct Scheduler {
    devices: Arc<dyn DeviceStore>,
    router: Arc<ProbeRouter>,
    sink: Arc<EventSink>,
    notifier: Arc<dyn Notifier>,
    config: parking_lot::Mutex<MonitorConfig>,
    inner: tokio::sync::Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        router: Arc<ProbeRouter>,
        sink: Arc<EventSink>,
        notifier: Arc<dyn Notifier>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            devices,
            router,
            sink,
            notifier,
            config: parking_lot::Mutex::new(config),
            inner: tokio::sync::Mutex::new(None),
        }
    }

    fn handler(&self) -> Arc<dyn ResultHandler> {
        Arc::new(MonitorHandler {
            devices: self.devices.clone(),
            sink: self.sink.clone(),
        })
    }

    /// Enter `Running`: launch the pool and the tick loop. The first
    /// fan-out happens immediately. A no-op when already running.
    pub async fn start(&self) {
        let mut inner = self.inner.lock().await;
        if inner.is_some() {
            log::debug!("scheduler already running");
            return;
        }

        let config = *self.config.lock();
        let mut pool = WorkerPool::new(config.workers);
        let submitter = pool.start(self.handler());

        let (stop_sender, stop_receiver) = watch::channel(false);
        let (interval_sender, interval_receiver) =
            watch::channel(config.interval_duration());
        let ticker = tokio::spawn(tick_loop(
            self.devices.clone(),
            self.router.clone(),
            submitter.clone(),
            stop_receiver,
            interval_receiver,
        ));

        log::info!(
            "monitoring started: interval {} s, {} workers",
            config.interval,
            config.workers
        );
        self.notifier.emit(topics::MONITORING_STARTED, json!({}));

        *inner = Some(Running {
            pool,
            submitter,
            ticker,
            stop_sender,
            interval_sender,
        });
    }

    /// Leave `Running`: cancel the tick loop, cancel in-flight
    /// probes, process results already delivered and drop work not
    /// yet begun. A no-op when already stopped.
    pub async fn stop(&self) {
        let Some(mut running) = self.inner.lock().await.take() else {
            log::debug!("scheduler already stopped");
            return;
        };

        let _ = running.stop_sender.send(true);
        if let Err(e) = (&mut running.ticker).await {
            log::warn!("tick loop failed to stop: {}", e);
        }
        running.pool.stop().await;

        log::info!("monitoring stopped");
        self.notifier.emit(topics::MONITORING_STOPPED, json!({}));
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Live configured values, not startup defaults.
    pub async fn status(&self) -> MonitorStatus {
        let config = *self.config.lock();
        MonitorStatus {
            running: self.inner.lock().await.is_some(),
            interval: config.interval,
            ping_timeout: config.ping_timeout,
            snmp_timeout: config.snmp_timeout,
            workers: config.workers,
        }
    }

    /// Accepted while running; takes effect from the next tick, with
    /// no sub-interval preemption.
    pub async fn set_interval(&self, interval: f64) {
        self.config.lock().interval = interval;
        if let Some(running) = self.inner.lock().await.as_ref() {
            let _ = running
                .interval_sender
                .send(Duration::from_secs_f64(interval));
        }
        log::info!("monitoring interval set to {} s", interval);
        self.notifier.emit(
            topics::SETTINGS_CHANGED,
            json!({ "interval": interval }),
        );
    }

    /// One immediate fan-out without touching the periodic cadence.
    /// With the scheduler stopped, a pool is started around the
    /// fan-out and stopped again after a short drain delay.
    pub async fn run_once(&self) {
        let inner = self.inner.lock().await;
        match inner.as_ref() {
            Some(running) => {
                fan_out(&self.devices, &self.router, &running.submitter)
                    .await;
            }
            None => {
                drop(inner);
                let config = *self.config.lock();
                let mut pool = WorkerPool::new(config.workers);
                let submitter = pool.start(self.handler());
                fan_out(&self.devices, &self.router, &submitter).await;
                tokio::time::sleep(RUN_ONCE_DRAIN).await;
                pool.stop().await;
            }
        }
    }
}

async fn tick_loop(
    devices: Arc<dyn DeviceStore>,
    router: Arc<ProbeRouter>,
    submitter: TaskSubmitter,
    mut stop_receiver: watch::Receiver<bool>,
    interval_receiver: watch::Receiver<Duration>,
) {
    loop {
        fan_out(&devices, &router, &submitter).await;

        let delay = *interval_receiver.borrow();
        tokio::select! {
            _ = stop_receiver.changed() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    log::debug!("tick loop stopped");
}

/// Snapshot the catalog and submit one probe task per device,
/// fire-and-forget under the pool's drop-on-full policy.
async fn fan_out(
    devices: &Arc<dyn DeviceStore>,
    router: &Arc<ProbeRouter>,
    submitter: &TaskSubmitter,
) {
    let snapshot = match devices.get_all().await {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("failed to enumerate devices: {}", e);
            return;
        }
    };

    log::debug!("tick: probing {} device(s)", snapshot.len());
    for device in snapshot {
        let router = router.clone();
        submitter.submit(ProbeTask::new(device.id, async move {
            router.probe(&device).await
        }));
    }
}

struct MonitorHandler {
    devices: Arc<dyn DeviceStore>,
    sink: Arc<EventSink>,
}

#[async_trait]
impl ResultHandler for MonitorHandler {
    async fn handle(&self, outcome: ProbeOutcome) {
        let device = match self.devices.get_by_id(outcome.device_id).await
        {
            Ok(device) => device,
            Err(e) => {
                // Deleted between fan-out and result; nothing to do.
                log::debug!(
                    "dropping result for device {}: {}",
                    outcome.device_id,
                    e
                );
                return;
            }
        };

        let old = device.status;
        let new = outcome.report.status;

        if let Err(e) = self
            .devices
            .update_status(device.id, new, Utc::now())
            .await
        {
            log::warn!(
                "failed to update status of device {}: {}",
                device.id,
                e
            );
        }

        self.sink
            .record_history(device.id, new, outcome.report.latency_ms)
            .await;

        if old != new && old != DeviceStatus::Unknown {
            let (event_type, level) = match new {
                DeviceStatus::Online => {
                    (EventType::DeviceOnline, EventLevel::Info)
                }
                _ => (EventType::DeviceOffline, EventLevel::Error),
            };
            let mut message =
                format!("Device {} is {}", device.name, new);
            if new == DeviceStatus::Offline {
                if let Some(diagnostic) = &outcome.report.diagnostic {
                    message.push_str(": ");
                    message.push_str(diagnostic);
                }
            }
            self.sink
                .emit_event(NewEvent {
                    device_id: Some(device.id),
                    event_type,
                    level,
                    message,
                })
                .await;
        }
    }
}
