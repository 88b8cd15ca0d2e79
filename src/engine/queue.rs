use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::notify::PushPayload;
use crate::observability::metrics::Metrics;

/// Side effects that run off the request path.
#[derive(Debug, Clone)]
pub enum BackgroundTask {
    RecomputeBestSellers,
    PushNotification {
        recipient: String,
        payload: PushPayload,
    },
}

impl BackgroundTask {
    pub fn kind(&self) -> &'static str {
        match self {
            BackgroundTask::RecomputeBestSellers => "ranking",
            BackgroundTask::PushNotification { .. } => "push",
        }
    }
}

#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<BackgroundTask>,
    metrics: Metrics,
}

impl TaskQueue {
    pub fn new(capacity: usize, metrics: Metrics) -> (Self, mpsc::Receiver<BackgroundTask>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, metrics }, rx)
    }

    /// Queues `task` without waiting. A full or closed queue drops the task.
    ///
    /// The depth gauge is raised before sending so the worker's decrement can
    /// never run first.
    pub fn dispatch(&self, task: BackgroundTask) -> bool {
        let kind = task.kind();
        self.metrics.tasks_in_queue.inc();
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(kind, "background queue full; task dropped");
                self.record_drop(kind);
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(kind, "background queue closed; task dropped");
                self.record_drop(kind);
                false
            }
        }
    }

    fn record_drop(&self, kind: &str) {
        self.metrics.tasks_in_queue.dec();
        self.metrics
            .background_tasks_total
            .with_label_values(&[kind, "dropped"])
            .inc();
    }
}
