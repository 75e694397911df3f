// src/dag/state_manager.rs

//! Per-run state transitions for tasks and channels.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::channel::{ChannelStore, ValueState};
use crate::dag::task_info::{OutputFile, ScheduledTask, TaskInfo, TaskStatus};
use crate::dag::DependencyGraph;
use crate::engine::TaskName;
use crate::types::ChannelKind;

/// Result of checking a task's required inputs.
enum InputCheck {
    /// Every required input is satisfiable right now.
    Satisfied,
    /// At least one required input is still being produced.
    Waiting,
    /// At least one required input will never be produced.
    Skipped,
}

/// Manages state transitions for tasks and their channels.
pub struct StateManager<'a> {
    graph: &'a DependencyGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    channels: &'a mut ChannelStore,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DependencyGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        channels: &'a mut ChannelStore,
    ) -> Self {
        Self {
            graph,
            tasks,
            channels,
        }
    }

    /// Determine whether the required inputs of the given task are
    /// satisfiable, still pending, or permanently absent.
    ///
    /// Optional inputs never participate: a task is ready as soon as its
    /// required inputs are satisfied, regardless of optional-input state.
    fn check_inputs(&self, info: &TaskInfo) -> InputCheck {
        let mut check = InputCheck::Satisfied;

        for binding in info.inputs.iter().filter(|b| !b.optional) {
            match self.channels.kind_of(&binding.channel) {
                Some(ChannelKind::Value) => {
                    match self.channels.value_state(&binding.channel) {
                        Some(ValueState::Ready(_)) => {}
                        Some(ValueState::Skipped) => return InputCheck::Skipped,
                        Some(ValueState::Empty) | None => check = InputCheck::Waiting,
                    }
                }
                Some(ChannelKind::Queue) => {
                    if !self.channels.settled(&binding.channel) {
                        check = InputCheck::Waiting;
                    } else if self.channels.queue_items(&binding.channel).is_empty() {
                        // All producers terminal, nothing ever arrived.
                        return InputCheck::Skipped;
                    }
                }
                None => {
                    // Should not happen with a validated pipeline.
                    warn!(
                        task = %info.name,
                        channel = %binding.channel,
                        "input bound to unknown channel"
                    );
                    check = InputCheck::Waiting;
                }
            }
        }

        check
    }

    /// Mark every output channel of the task as never-to-be-filled and
    /// record the producer as terminal on each of them.
    pub fn skip_outputs(&mut self, task: &str) {
        let outputs = match self.tasks.get(task) {
            Some(info) => info.outputs.clone(),
            None => return,
        };

        for out in outputs {
            for channel in out.channels {
                self.channels.mark_skipped(&channel);
                self.channels.producer_finished(&channel);
            }
        }
    }

    /// Skip every blocked task whose required inputs can no longer be
    /// produced, transitively: a skipped task's own outputs become absent,
    /// which may skip further consumers. Runs to fixpoint.
    ///
    /// Each skip is surfaced as a warning so a tolerated upstream failure
    /// never degrades the run silently.
    pub fn propagate_skips(&mut self) -> Vec<TaskName> {
        let mut all_skipped = Vec::new();

        loop {
            let candidates: Vec<TaskName> = self
                .tasks
                .values()
                .filter(|info| {
                    info.status == TaskStatus::Blocked
                        && matches!(self.check_inputs(info), InputCheck::Skipped)
                })
                .map(|info| info.name.clone())
                .collect();

            if candidates.is_empty() {
                break;
            }

            for name in candidates {
                if let Some(info) = self.tasks.get_mut(&name) {
                    info.status = TaskStatus::Skipped;
                }
                warn!(
                    task = %name,
                    "skipping task: a required input will never be produced"
                );
                self.skip_outputs(&name);
                all_skipped.push(name);
            }
        }

        all_skipped
    }

    /// Collect tasks that are `Blocked` with satisfiable required inputs,
    /// mark them `Ready` then `Running`, and return the resolved dispatch
    /// payloads.
    pub fn collect_new_ready_tasks(
        &mut self,
        params: &BTreeMap<String, String>,
        run_dir: &Path,
    ) -> Vec<ScheduledTask> {
        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| {
                info.status == TaskStatus::Blocked
                    && matches!(self.check_inputs(info), InputCheck::Satisfied)
            })
            .map(|info| info.name.clone())
            .collect();

        for name in &candidates {
            if let Some(info) = self.tasks.get_mut(name) {
                info.status = TaskStatus::Ready;
            }
        }

        let mut ready = Vec::new();
        for name in candidates {
            let scheduled = match self.tasks.get(&name) {
                Some(info) => build_scheduled(info, self.channels, params, run_dir),
                None => continue,
            };

            if let Some(info) = self.tasks.get_mut(&name) {
                info.status = TaskStatus::Running;
            }
            info!(task = %name, "inputs satisfied; dispatching");
            ready.push(scheduled);
        }

        ready
    }

}

/// Tasks that were never dispatched because an aborting failure cut them
/// off: blocked consumers reachable from the failed tasks first, then any
/// other still-blocked task.
pub fn never_dispatched(
    graph: &DependencyGraph,
    tasks: &HashMap<TaskName, TaskInfo>,
    failed: &[TaskName],
) -> Vec<TaskName> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut order: Vec<TaskName> = Vec::new();
    let mut queue: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();

    while let Some(name) = queue.pop() {
        for dependent in graph.dependents_of(name) {
            if seen.insert(dependent.as_str()) {
                if let Some(info) = tasks.get(dependent) {
                    if info.status == TaskStatus::Blocked {
                        order.push(dependent.clone());
                    }
                }
                queue.push(dependent.as_str());
            }
        }
    }

    let mut rest: Vec<TaskName> = tasks
        .values()
        .filter(|info| info.status == TaskStatus::Blocked && !seen.contains(info.name.as_str()))
        .map(|info| info.name.clone())
        .collect();
    rest.sort();
    order.extend(rest);

    order
}

/// Resolve a task's dispatch payload against the current channel state.
fn build_scheduled(
    info: &TaskInfo,
    channels: &ChannelStore,
    params: &BTreeMap<String, String>,
    run_dir: &Path,
) -> ScheduledTask {
    let workdir = run_dir.join(&info.name);

    // Scalar params first; input and output bindings shadow them on a
    // name collision.
    let mut bindings = params.clone();
    let mut input_paths = Vec::new();

    for binding in &info.inputs {
        let paths: Vec<String> = match channels.kind_of(&binding.channel) {
            Some(ChannelKind::Value) => match channels.value_state(&binding.channel) {
                Some(ValueState::Ready(artifact)) => vec![artifact.path_string()],
                // Only reachable for optional inputs; required ones gated
                // readiness above.
                _ => Vec::new(),
            },
            Some(ChannelKind::Queue) => channels
                .queue_items(&binding.channel)
                .iter()
                .map(|a| a.path_string())
                .collect(),
            None => Vec::new(),
        };

        if binding.optional && paths.is_empty() {
            debug!(
                task = %info.name,
                input = %binding.param,
                "optional input not ready at dispatch; binding empty"
            );
        }

        input_paths.extend(paths.iter().map(std::path::PathBuf::from));
        bindings.insert(binding.param.clone(), paths.join(" "));
    }

    let outputs: Vec<OutputFile> = info
        .outputs
        .iter()
        .map(|out| OutputFile {
            name: out.name.clone(),
            path: workdir.join(&out.name),
        })
        .collect();

    for out in &outputs {
        bindings.insert(out.name.clone(), out.path.display().to_string());
    }

    ScheduledTask {
        name: info.name.clone(),
        kind: info.kind,
        cmd: info.cmd.clone(),
        bindings,
        input_paths,
        outputs,
        workdir,
        timeout: info.timeout,
    }
}
