// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::{TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the runtime loop exits (the run reached a terminal
    /// state).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Start the run by dispatching the source tasks.
pub fn handle_bootstrap(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.bootstrap();
    step_to_core(step.newly_scheduled, step.run_finished)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.handle_completion(&task, outcome);
    step_to_core(step.newly_scheduled, step.run_finished)
}

/// Handle a hard cancel: stop dispatching and exit the loop; in-flight
/// processes are killed by the executor when the loop is torn down.
pub fn handle_shutdown(scheduler: &mut Scheduler) -> CoreStep {
    scheduler.request_abort();
    CoreStep {
        commands: Vec::new(),
        keep_running: false,
    }
}

fn step_to_core(newly_scheduled: Vec<ScheduledTask>, run_finished: bool) -> CoreStep {
    let mut commands = Vec::new();

    if !newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(newly_scheduled));
    }

    if run_finished {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running: !run_finished,
    }
}
