// src/exec/executor_loop.rs

//! Main executor loop that manages running task processes.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what the runtime (or
/// `RealExecutorBackend`) uses to dispatch tasks. Each scheduled task is
/// executed in its own Tokio task; concurrency is bounded by a semaphore of
/// `max_parallel` permits, acquired inside the spawned task so the loop
/// stays responsive while permits are exhausted.
///
/// When the loop is torn down (dispatch channel closed), the cancel sender
/// for every in-flight task is dropped, which kills the child processes —
/// this is what makes Ctrl-C a hard cancel.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    max_parallel: usize,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));

    tokio::spawn(async move {
        info!(max_parallel, "executor loop started");

        // Cancel handles for every dispatched task; dropped together when
        // the loop ends.
        let mut cancels: Vec<oneshot::Sender<()>> = Vec::new();

        while let Some(task) = rx.recv().await {
            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            cancels.push(cancel_tx);

            let rt_tx = runtime_tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let name = task.name.clone();

            tokio::spawn(async move {
                // Closed semaphores can't happen here; treat an error as a
                // torn-down executor and bail quietly.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                run_task(task, rt_tx, cancel_rx).await;
                debug!(task = %name, "task runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
