// src/engine/mod.rs

//! Orchestration engine for gwasdag.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the main runtime event loop that reacts to task completions and
//!   shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. All graph-state mutation happens inside the
//! core on the runtime's event loop, so sibling completions can never race
//! when updating shared readiness state.

use std::collections::BTreeMap;
use std::fmt;

use crate::artifact::Artifact;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Execution-time failure taxonomy, classified per-task by its
/// `FailurePolicy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecFailure {
    /// The process returned a non-zero status.
    NonZeroExit(i32),
    /// The configured wall-clock limit elapsed before the process exited.
    TimeoutExceeded,
    /// The process exited zero but the named declared output was not
    /// produced (or was empty).
    MissingOutput(String),
}

impl fmt::Display for ExecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecFailure::NonZeroExit(code) => {
                write!(f, "process exited with non-zero status {code}")
            }
            ExecFailure::TimeoutExceeded => write!(f, "timeout exceeded"),
            ExecFailure::MissingOutput(name) => {
                write!(f, "declared output '{name}' missing or empty")
            }
        }
    }
}

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The task completed and produced every declared output.
    Success {
        /// Captured artifacts, keyed by declared output name.
        artifacts: BTreeMap<String, Artifact>,
    },
    Failed(ExecFailure),
}

/// Events flowing into the runtime from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task reached a terminal execution outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Hard cancel requested (e.g. Ctrl-C); in-flight processes are killed.
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{FailureRecord, RunReport, RunStatus};
pub use runtime::Runtime;
