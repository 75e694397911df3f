// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible
//! for reading events from channels, sending `ScheduledTask`s to the
//! executor and handling Ctrl+C. The core is intended to be extensively
//! unit tested without any Tokio, channels, filesystem, or processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    handle_bootstrap, handle_shutdown, handle_task_completion, CoreStep,
};
use crate::engine::report::RunReport;
use crate::engine::RuntimeEvent;

/// Pure core runtime state.
///
/// Owns the DAG scheduler; has **no** channels, no Tokio types, and does
/// not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Start the run: dispatch source tasks.
    pub fn bootstrap(&mut self) -> CoreStep {
        handle_bootstrap(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.scheduler),
        }
    }

    /// Whether the run has reached a terminal state (for tests).
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Consume the core, producing the final run report.
    pub fn into_report(self) -> RunReport {
        self.scheduler.report()
    }
}
