// src/engine/report.rs

//! Diagnostic summary of a finished run.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::dag::TaskStatus;
use crate::engine::{ExecFailure, TaskName};
use crate::types::FailurePolicy;

/// Final status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No task failed under a `fail` policy.
    Succeeded,
    /// A `fail`-policy failure (or a hard cancel) ended the run early.
    Aborted,
}

/// One recorded task failure, in completion order.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub task: TaskName,
    pub failure: ExecFailure,
    pub policy: FailurePolicy,
}

/// Per-task terminal statuses plus the ordered list of failures.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub task_status: BTreeMap<TaskName, TaskStatus>,
    pub failures: Vec<FailureRecord>,
    /// For aborted runs: the chain of consumers that were never dispatched
    /// as a result of the failure.
    pub never_dispatched: Vec<TaskName>,
}

impl RunReport {
    /// Terminal status of one task, if known.
    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.task_status.get(task).copied()
    }

    /// Log the run summary at the end of a run.
    pub fn log_summary(&self) {
        let succeeded = self.count(TaskStatus::Succeeded);
        let failed = self.count(TaskStatus::Failed);
        let skipped = self.count(TaskStatus::Skipped);

        info!(
            status = ?self.status,
            succeeded,
            failed,
            skipped,
            "pipeline run finished"
        );

        for record in &self.failures {
            warn!(
                task = %record.task,
                failure = %record.failure,
                policy = ?record.policy,
                "task failed"
            );
        }
        for task in &self.never_dispatched {
            warn!(task = %task, "never dispatched due to upstream abort");
        }
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.task_status.values().filter(|s| **s == status).count()
    }
}
