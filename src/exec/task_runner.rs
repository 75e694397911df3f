// src/exec/task_runner.rs

//! Individual task execution and outcome classification.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::artifact::Artifact;
use crate::dag::ScheduledTask;
use crate::engine::{ExecFailure, RuntimeEvent, TaskOutcome};
use crate::types::TaskKind;

use super::{merge, template};

/// Run a single task and emit a `TaskCompleted` event with the classified
/// outcome.
///
/// - If the cancel channel fires (hard shutdown), the child process is
///   killed and **no** `TaskCompleted` event is sent; the scheduler has
///   already stopped caring at that point.
/// - Internal errors (spawn failure, unreadable output file) are reported
///   as `NonZeroExit(-1)` so the scheduler's failure policies still apply.
pub async fn run_task(
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let task_name = task.name.clone();

    let outcome = match run_task_inner(task, cancel_rx).await {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            // Cancelled instance; stay silent.
            return;
        }
        Err(err) => {
            error!(task = %task_name, error = %err, "task execution error");
            TaskOutcome::Failed(ExecFailure::NonZeroExit(-1))
        }
    };

    let _ = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task_name,
            outcome,
        })
        .await;
}

async fn run_task_inner(
    task: ScheduledTask,
    cancel_rx: oneshot::Receiver<()>,
) -> Result<Option<TaskOutcome>> {
    tokio::fs::create_dir_all(&task.workdir)
        .await
        .with_context(|| format!("creating working directory {:?}", task.workdir))?;

    match task.kind {
        TaskKind::Merge => run_merge(&task).await.map(Some),
        TaskKind::Command => run_command(task, cancel_rx).await,
    }
}

/// Built-in merge task: union the bound identifier lists into the single
/// declared output.
async fn run_merge(task: &ScheduledTask) -> Result<TaskOutcome> {
    let out = task
        .outputs
        .first()
        .context("merge task with no declared output")?;

    info!(
        task = %task.name,
        inputs = task.input_paths.len(),
        "merging identifier lists"
    );

    let count = merge::merge_id_lists(&task.input_paths, &out.path).await?;
    debug!(task = %task.name, ids = count, "merge complete");

    collect_outputs(task)
}

async fn run_command(
    task: ScheduledTask,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<Option<TaskOutcome>> {
    let template_str = task
        .cmd
        .as_deref()
        .context("command task with no cmd")?;
    let resolved = template::resolve(template_str, &task.bindings);

    info!(task = %task.name, cmd = %resolved, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&resolved);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&resolved);
        c
    };

    cmd.current_dir(&task.workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.name))?;

    // Always consume stdout/stderr so buffers don't fill; log at debug.
    if let Some(stdout) = child.stdout.take() {
        let task_name = task.name.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stdout: {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let task_name = task.name.clone();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        });
    }

    let timeout = task.timeout;

    // Either the process exits on its own (normal case), the configured
    // timeout elapses, or we receive a hard-cancel request.
    tokio::select! {
        status_res = child.wait() => {
            let status = status_res.with_context(|| {
                format!("waiting for process of task '{}'", task.name)
            })?;

            let code = status.code().unwrap_or(-1);
            info!(
                task = %task.name,
                exit_code = code,
                success = status.success(),
                "task process exited"
            );

            if status.success() {
                collect_outputs(&task).map(Some)
            } else {
                Ok(Some(TaskOutcome::Failed(ExecFailure::NonZeroExit(code))))
            }
        }

        _ = tokio::time::sleep(timeout.unwrap_or(Duration::MAX)), if timeout.is_some() => {
            warn!(
                task = %task.name,
                timeout_secs = timeout.map(|t| t.as_secs()),
                "task exceeded its timeout; killing process"
            );
            if let Err(e) = child.kill().await {
                warn!(task = %task.name, error = %e, "failed to kill timed-out process");
            }
            Ok(Some(TaskOutcome::Failed(ExecFailure::TimeoutExceeded)))
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(
                        task = %task.name,
                        "cancellation requested for running task; killing process"
                    );
                    if let Err(e) = child.kill().await {
                        warn!(
                            task = %task.name,
                            error = %e,
                            "failed to kill child process on cancellation"
                        );
                    }
                }
                Err(e) => {
                    debug!(
                        task = %task.name,
                        error = %e,
                        "cancel channel closed; executor torn down"
                    );
                    // Child is killed on drop due to kill_on_drop(true).
                }
            }
            // Do NOT send TaskCompleted for a cancelled instance.
            Ok(None)
        }
    }
}

/// Capture every declared output as an artifact.
///
/// An output that does not exist, or exists but is empty, classifies the
/// whole task as `MissingOutput` even though the process exited zero.
fn collect_outputs(task: &ScheduledTask) -> Result<TaskOutcome> {
    let mut artifacts = BTreeMap::new();

    for out in &task.outputs {
        match std::fs::metadata(&out.path) {
            Ok(meta) if meta.len() > 0 => {
                let artifact = Artifact::capture(&out.path)?;
                artifacts.insert(out.name.clone(), artifact);
            }
            _ => {
                warn!(
                    task = %task.name,
                    output = %out.name,
                    path = ?out.path,
                    "declared output missing or empty"
                );
                return Ok(TaskOutcome::Failed(ExecFailure::MissingOutput(
                    out.name.clone(),
                )));
            }
        }
    }

    Ok(TaskOutcome::Success { artifacts })
}
