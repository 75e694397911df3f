// src/dag/task_info.rs

//! Task metadata and per-run state.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::TaskConfig;
use crate::engine::TaskName;
use crate::types::{FailurePolicy, TaskKind};

/// State of a task within the run.
///
/// `Blocked -> Ready -> Running -> {Succeeded | Failed | Skipped}`.
///
/// `Ready` is the dispatch edge: the scheduler marks a task `Ready` the
/// moment its required inputs are satisfiable and hands it to the executor
/// as `Running` in the same step, so externally `Ready` is only ever seen
/// mid-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for one or more required input channels.
    Blocked,
    /// Required inputs satisfiable; about to be dispatched.
    Ready,
    /// Dispatched to the executor.
    Running,
    /// Process exited zero and all declared outputs were captured.
    Succeeded,
    /// Execution failed (non-zero exit, timeout, or missing output).
    Failed,
    /// Never dispatched: a required input was produced by a task that
    /// failed under an ignore policy (or was itself skipped).
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

/// One input binding: a template parameter fed from a channel.
#[derive(Debug, Clone)]
pub struct InputBinding {
    pub param: String,
    pub channel: String,
    /// Zero-or-one inputs never gate readiness; they resolve to the empty
    /// string when the channel is not ready at dispatch time.
    pub optional: bool,
}

/// One output binding: a declared output fanned into one or more channels.
#[derive(Debug, Clone)]
pub struct OutputBinding {
    pub name: String,
    pub channels: Vec<String>,
}

/// Static task information from the pipeline definition, plus run status.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub kind: TaskKind,
    pub cmd: Option<String>,
    pub inputs: Vec<InputBinding>,
    pub outputs: Vec<OutputBinding>,
    pub on_failure: FailurePolicy,
    pub timeout: Option<Duration>,

    pub status: TaskStatus,
}

impl TaskInfo {
    pub fn from_config(name: TaskName, cfg: &TaskConfig) -> Self {
        let inputs = cfg
            .input_bindings()
            .map(|(param, channel, optional)| InputBinding {
                param: param.to_string(),
                channel: channel.to_string(),
                optional,
            })
            .collect();

        let outputs = cfg
            .outputs
            .iter()
            .map(|(name, channels)| OutputBinding {
                name: name.clone(),
                channels: channels.names().to_vec(),
            })
            .collect();

        Self {
            name,
            kind: cfg.kind,
            cmd: cfg.cmd.clone(),
            inputs,
            outputs,
            on_failure: cfg.on_failure,
            timeout: cfg.timeout_secs.map(Duration::from_secs),
            status: TaskStatus::Blocked,
        }
    }
}

/// A declared output and the file the task must produce for it.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub path: PathBuf,
}

/// Fully resolved dispatch payload handed to the executor.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Unresolved command template (command tasks only).
    pub cmd: Option<String>,
    /// Placeholder bindings: input artifact paths, output file paths, and
    /// scalar `[params]` values.
    pub bindings: BTreeMap<String, String>,
    /// Paths of every artifact bound to the task's inputs, in binding
    /// order. Merge tasks union these.
    pub input_paths: Vec<PathBuf>,
    /// Declared outputs the executor must find after the process exits.
    pub outputs: Vec<OutputFile>,
    /// Working directory exclusive to this task for the duration of the run.
    pub workdir: PathBuf,
    pub timeout: Option<Duration>,
}
