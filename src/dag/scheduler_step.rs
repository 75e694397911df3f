// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// Tasks that became ready and were handed out for execution.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked `Skipped` because a required input will never be
    /// produced.
    pub newly_skipped: Vec<TaskName>,
    /// Whether this step caused the run to finish.
    pub run_finished: bool,
}

impl SchedulerStep {
    pub fn empty() -> Self {
        Self {
            newly_scheduled: Vec::new(),
            newly_skipped: Vec::new(),
            run_finished: false,
        }
    }
}
