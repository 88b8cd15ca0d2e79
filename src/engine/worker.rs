use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::queue::BackgroundTask;
use crate::error::AppError;
use crate::notify::NotifyError;
use crate::state::AppState;

pub async fn run_task_worker(state: Arc<AppState>, mut task_rx: mpsc::Receiver<BackgroundTask>) {
    info!("background worker started");

    while let Some(task) = task_rx.recv().await {
        state.metrics.tasks_in_queue.dec();

        let kind = task.kind();
        let start = Instant::now();
        match process_task(&state, task).await {
            Ok(outcome) => {
                state
                    .metrics
                    .background_tasks_total
                    .with_label_values(&[kind, outcome])
                    .inc();
            }
            Err(err) => {
                state
                    .metrics
                    .background_tasks_total
                    .with_label_values(&[kind, "error"])
                    .inc();
                error!(kind, error = %err, elapsed_ms = start.elapsed().as_millis() as u64, "background task failed");
            }
        }
    }

    warn!("background worker stopped: task channel closed");
}

/// Returns the outcome label recorded for a task that did not fail.
async fn process_task(state: &AppState, task: BackgroundTask) -> Result<&'static str, AppError> {
    match task {
        BackgroundTask::RecomputeBestSellers => {
            let ranking = state.ranking.clone();
            let start = Instant::now();
            tokio::task::spawn_blocking(move || ranking.recompute())
                .await
                .map_err(|err| {
                    state
                        .metrics
                        .ranking_duration_seconds
                        .with_label_values(&["error"])
                        .observe(start.elapsed().as_secs_f64());
                    AppError::Internal(format!("ranking task panicked: {err}"))
                })?;
            Ok("success")
        }
        BackgroundTask::PushNotification { recipient, payload } => {
            match state.notifier.notify(&recipient, &payload).await {
                Ok(()) => Ok("success"),
                Err(NotifyError::NoSubscription(_)) => {
                    debug!(recipient = %recipient, "no push subscription; notification skipped");
                    Ok("skipped")
                }
                Err(err @ NotifyError::Delivery(_)) => Err(AppError::Internal(format!(
                    "push to {recipient} failed: {err}"
                ))),
            }
        }
    }
}
