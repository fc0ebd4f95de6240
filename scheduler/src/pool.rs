/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use device_base::DeviceId;
use protocol::ProbeReport;

/// Bounded task queue; a full queue drops new submissions.
pub const QUEUE_CAPACITY: usize = 100;

/// Hard cap per task, whatever the sub-probe timeouts add up to.
pub const TASK_TIMEOUT: Duration = Duration::from_secs(10);

/// One probe to run: the future produces the normalized report for
/// the device.
pub struct ProbeTask {
    pub device_id: DeviceId,
    pub work: Pin<Box<dyn Future<Output = ProbeReport> + Send>>,
}

impl ProbeTask {
    pub fn new(
        device_id: DeviceId,
        work: impl Future<Output = ProbeReport> + Send + 'static,
    ) -> Self {
        Self {
            device_id,
            work: Box::pin(work),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProbeOutcome {
    pub device_id: DeviceId,
    pub report: ProbeReport,
    pub elapsed: Duration,
}

/// Consumes results one at a time; the pool's single consumer task
/// serializes all store writes through this handler.
#[async_trait]
pub trait ResultHandler: Send + Sync {
    async fn handle(&self, outcome: ProbeOutcome);
}

/// Submission handle, cloneable into the tick loop. Submission never
/// blocks: when the queue is full the task is dropped with a warning,
/// trading one lagging tick against unbounded backlog.
#[derive(Clone)]
pub struct TaskSubmitter {
    sender: mpsc::Sender<ProbeTask>,
}

impl TaskSubmitter {
    pub fn submit(&self, task: ProbeTask) -> bool {
        let device_id = task.device_id;
        match self.sender.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "probe queue full; dropping probe for device {}",
                    device_id
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::warn!(
                    "probe queue closed; dropping probe for device {}",
                    device_id
                );
                false
            }
        }
    }
}

struct Running {
    task_sender: mpsc::Sender<ProbeTask>,
    stop_sender: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    consumer: JoinHandle<()>,
}

/// Fixed-size worker pool over a bounded task queue. `start`
/// constructs fresh channels and a fresh stop root every time, so a
/// stopped pool restarts cleanly; nothing is reused across a stop.
pub struct WorkerPool {
    worker_count: usize,
    inner: Option<Running>,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            inner: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_some()
    }

    pub fn start(
        &mut self,
        handler: Arc<dyn ResultHandler>,
    ) -> TaskSubmitter {
        if let Some(running) = &self.inner {
            log::debug!("worker pool already running");
            return TaskSubmitter {
                sender: running.task_sender.clone(),
            };
        }

        let (task_sender, task_receiver) =
            mpsc::channel::<ProbeTask>(QUEUE_CAPACITY);
        let (result_sender, mut result_receiver) =
            mpsc::channel::<ProbeOutcome>(QUEUE_CAPACITY);
        let (stop_sender, _) = watch::channel(false);
        let task_receiver = Arc::new(Mutex::new(task_receiver));

        let workers = (0..self.worker_count)
            .map(|n| {
                tokio::spawn(run_worker(
                    n,
                    task_receiver.clone(),
                    result_sender.clone(),
                    stop_sender.subscribe(),
                ))
            })
            .collect();
        drop(result_sender);

        // Single consumer: results are handled one at a time, which
        // serializes all store writes without further locking.
        let consumer = tokio::spawn(async move {
            while let Some(outcome) = result_receiver.recv().await {
                handler.handle(outcome).await;
            }
            log::debug!("result consumer finished");
        });

        log::debug!("worker pool started with {} workers", self.worker_count);
        let submitter = TaskSubmitter {
            sender: task_sender.clone(),
        };
        self.inner = Some(Running {
            task_sender,
            stop_sender,
            workers,
            consumer,
        });
        submitter
    }

    pub fn submitter(&self) -> Option<TaskSubmitter> {
        self.inner.as_ref().map(|running| TaskSubmitter {
            sender: running.task_sender.clone(),
        })
    }

    pub fn submit(&self, task: ProbeTask) -> bool {
        match self.submitter() {
            Some(submitter) => submitter.submit(task),
            None => {
                log::warn!(
                    "worker pool not running; dropping probe for device {}",
                    task.device_id
                );
                false
            }
        }
    }

    /// Cancel in-flight work, drop queued tasks, process the results
    /// already delivered, and wait for everything to wind down.
    pub async fn stop(&mut self) {
        let Some(running) = self.inner.take() else {
            log::debug!("worker pool already stopped");
            return;
        };

        let _ = running.stop_sender.send(true);
        drop(running.task_sender);

        for worker in running.workers {
            if let Err(e) = worker.await {
                log::warn!("worker failed to stop: {}", e);
            }
        }
        // All result senders are gone now; the consumer drains what
        // was delivered and exits.
        if let Err(e) = running.consumer.await {
            log::warn!("result consumer failed to stop: {}", e);
        }
        log::debug!("worker pool stopped");
    }
}

async fn run_worker(
    n: usize,
    task_receiver: Arc<Mutex<mpsc::Receiver<ProbeTask>>>,
    result_sender: mpsc::Sender<ProbeOutcome>,
    mut stop_receiver: watch::Receiver<bool>,
) {
    log::debug!("probe worker {} started", n);
    loop {
        let task = {
            let mut receiver = task_receiver.lock().await;
            tokio::select! {
                _ = stop_receiver.changed() => None,
                task = receiver.recv() => task,
            }
        };
        let Some(task) = task else { break };

        let start = Instant::now();
        let report = tokio::select! {
            // Cancellation root: dropping the work future aborts the
            // in-flight probe i/o.
            _ = stop_receiver.changed() => break,
            result = timeout(TASK_TIMEOUT, task.work) => match result {
                Ok(report) => report,
                Err(_) => ProbeReport::offline(Some(format!(
                    "probe timed out after {} s",
                    TASK_TIMEOUT.as_secs()
                ))),
            },
        };

        let outcome = ProbeOutcome {
            device_id: task.device_id,
            report,
            elapsed: start.elapsed(),
        };
        if result_sender.send(outcome).await.is_err() {
            break;
        }
    }
    log::debug!("probe worker {} stopped", n);
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_base::DeviceStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        handled: AtomicUsize,
    }

    #[async_trait]
    impl ResultHandler for Counter {
        async fn handle(&self, _outcome: ProbeOutcome) {
            self.handled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn quick_task(id: i64) -> ProbeTask {
        ProbeTask::new(DeviceId(id), async { ProbeReport::online(1.0) })
    }

    #[tokio::test]
    async fn results_reach_the_handler() {
        let handler = Arc::new(Counter {
            handled: AtomicUsize::new(0),
        });
        let mut pool = WorkerPool::new(2);
        pool.start(handler.clone());
        for id in 0..5 {
            assert!(pool.submit(quick_task(id)));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        pool.stop().await;
        assert_eq!(handler.handled.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn full_queue_drops_submissions() {
        let handler = Arc::new(Counter {
            handled: AtomicUsize::new(0),
        });
        // One worker stuck on a slow task; the queue fills behind it.
        let mut pool = WorkerPool::new(1);
        pool.start(handler.clone());
        assert!(pool.submit(ProbeTask::new(DeviceId(0), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ProbeReport::online(1.0)
        })));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut accepted = 0;
        let mut dropped = 0;
        for id in 1..=(QUEUE_CAPACITY as i64 + 10) {
            match pool.submit(quick_task(id)) {
                true => accepted += 1,
                false => dropped += 1,
            }
        }
        assert_eq!(accepted, QUEUE_CAPACITY);
        assert_eq!(dropped, 10);
        pool.stop().await;
    }

    #[tokio::test]
    async fn stop_then_start_is_fresh() {
        let handler = Arc::new(Counter {
            handled: AtomicUsize::new(0),
        });
        let mut pool = WorkerPool::new(2);
        pool.start(handler.clone());
        pool.stop().await;
        assert!(!pool.is_running());

        pool.start(handler.clone());
        assert!(pool.is_running());
        assert!(pool.submit(quick_task(1)));
        tokio::time::sleep(Duration::from_millis(100)).await;
        pool.stop().await;
        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn task_timeout_reports_offline() {
        struct Capture {
            status: parking_lot::Mutex<Option<DeviceStatus>>,
        }

        #[async_trait]
        impl ResultHandler for Capture {
            async fn handle(&self, outcome: ProbeOutcome) {
                *self.status.lock() = Some(outcome.report.status);
            }
        }

        let handler = Arc::new(Capture {
            status: parking_lot::Mutex::new(None),
        });
        let mut pool = WorkerPool::new(1);
        pool.start(handler.clone());

        tokio::time::pause();
        pool.submit(ProbeTask::new(DeviceId(7), async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ProbeReport::online(1.0)
        }));
        tokio::time::sleep(TASK_TIMEOUT + Duration::from_secs(1)).await;
        tokio::time::resume();

        tokio::time::sleep(Duration::from_millis(100)).await;
        pool.stop().await;
        assert_eq!(
            *handler.status.lock(),
            Some(DeviceStatus::Offline)
        );
    }
}
