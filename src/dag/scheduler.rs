use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::channel::ChannelStore;
use crate::config::model::PipelineFile;
use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{TaskInfo, TaskStatus};
use crate::engine::report::{FailureRecord, RunReport, RunStatus};
use crate::engine::{TaskName, TaskOutcome};
use crate::types::FailurePolicy;

/// Scheduler holds the immutable dependency graph plus the run's mutable
/// state: task statuses and the channel arena.
///
/// It is responsible for:
/// - deciding when a task is ready to run (required inputs satisfiable)
/// - publishing completed outputs into every bound channel (fan-out)
/// - skipping consumers of outputs that will never exist
/// - aborting the run when a `fail`-policy task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DependencyGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    channels: ChannelStore,
    params: BTreeMap<String, String>,
    run_dir: PathBuf,

    /// Set once a `fail`-policy failure (or a hard cancel) is seen; from
    /// then on nothing new is dispatched and in-flight tasks drain.
    aborting: bool,
    /// Every execution failure seen so far, in completion order.
    failures: Vec<FailureRecord>,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`PipelineFile`].
    pub fn from_pipeline(cfg: &PipelineFile, run_dir: &Path) -> Self {
        let graph = DependencyGraph::from_pipeline(cfg);

        let channels = ChannelStore::new(
            graph
                .channels()
                .map(|(name, topo)| (name, topo.kind, topo.producers.len())),
        );

        let tasks = cfg
            .task
            .iter()
            .map(|(name, tc)| (name.clone(), TaskInfo::from_config(name.clone(), tc)))
            .collect();

        Self {
            graph,
            tasks,
            channels,
            params: cfg.params.clone(),
            run_dir: run_dir.to_path_buf(),
            aborting: false,
            failures: Vec::new(),
        }
    }

    /// Dispatch the source tasks (those with no required inputs) to start
    /// the run.
    pub fn bootstrap(&mut self) -> SchedulerStep {
        debug!(tasks = self.tasks.len(), "scheduler: starting run");

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, &mut self.channels);
        let newly_scheduled = manager.collect_new_ready_tasks(&self.params, &self.run_dir);
        let run_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped: Vec::new(),
            run_finished,
        }
    }

    /// Handle completion of a task with a concrete outcome.
    ///
    /// - On success, each declared output artifact is published into every
    ///   bound channel and direct consumers are re-evaluated.
    /// - On failure under a `fail` policy, the run starts aborting.
    /// - On failure under an `ignore` policy, the task's outputs are marked
    ///   absent and consumers that require them are transitively skipped.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        if !self.tasks.contains_key(task) {
            warn!(task = %task, "completion for unknown task; ignoring");
            return SchedulerStep::empty();
        }

        match outcome {
            TaskOutcome::Success { artifacts } => {
                self.complete_success(task, artifacts);
            }
            TaskOutcome::Failed(failure) => {
                self.complete_failure(task, failure);
            }
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, &mut self.channels);
        let newly_skipped = manager.propagate_skips();
        let newly_scheduled = if self.aborting {
            Vec::new()
        } else {
            manager.collect_new_ready_tasks(&self.params, &self.run_dir)
        };
        let run_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_finished,
        }
    }

    /// Stop dispatching immediately (hard cancel, e.g. Ctrl-C). The run
    /// will report `Aborted`.
    pub fn request_abort(&mut self) {
        if !self.aborting {
            warn!("abort requested; no further tasks will be dispatched");
            self.aborting = true;
        }
    }

    /// Read-only view of the given task's status.
    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.tasks.get(task).map(|info| info.status)
    }

    /// Returns a snapshot of task names for diagnostics and tests.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// The dependency graph backing this scheduler.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Whether the run has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        let any_active = self
            .tasks
            .values()
            .any(|t| matches!(t.status, TaskStatus::Ready | TaskStatus::Running));
        if any_active {
            return false;
        }
        self.aborting || self.tasks.values().all(|t| t.status.is_terminal())
    }

    /// Diagnostic summary of the run as it stands.
    pub fn report(&self) -> RunReport {
        let status = if self.aborting {
            RunStatus::Aborted
        } else {
            RunStatus::Succeeded
        };

        let task_status: BTreeMap<TaskName, TaskStatus> = self
            .tasks
            .values()
            .map(|info| (info.name.clone(), info.status))
            .collect();

        let aborting_failures: Vec<TaskName> = self
            .failures
            .iter()
            .filter(|f| f.policy == FailurePolicy::Fail)
            .map(|f| f.task.clone())
            .collect();

        let never_dispatched = if self.aborting {
            crate::dag::state_manager::never_dispatched(
                &self.graph,
                &self.tasks,
                &aborting_failures,
            )
        } else {
            Vec::new()
        };

        RunReport {
            status,
            task_status,
            failures: self.failures.clone(),
            never_dispatched,
        }
    }

    fn complete_success(&mut self, task: &str, artifacts: BTreeMap<String, crate::artifact::Artifact>) {
        let Some(info) = self.tasks.get_mut(task) else {
            return;
        };
        info.status = TaskStatus::Succeeded;
        info!(task = %task, "task completed successfully");

        let outputs = info.outputs.clone();
        for out in outputs {
            match artifacts.get(&out.name) {
                Some(artifact) => {
                    // One handle, published into every bound channel:
                    // fan-out consumers share the same underlying data.
                    let handle = Arc::new(artifact.clone());
                    for channel in &out.channels {
                        self.channels.publish(channel, Arc::clone(&handle));
                    }
                }
                None => {
                    // The executor reports MissingOutput itself; reaching
                    // this means a backend broke the contract.
                    warn!(
                        task = %task,
                        output = %out.name,
                        "success reported without artifact for declared output; marking absent"
                    );
                    for channel in &out.channels {
                        self.channels.mark_skipped(channel);
                    }
                }
            }
            for channel in &out.channels {
                self.channels.producer_finished(channel);
            }
        }
    }

    fn complete_failure(&mut self, task: &str, failure: crate::engine::ExecFailure) {
        let Some(info) = self.tasks.get_mut(task) else {
            return;
        };
        info.status = TaskStatus::Failed;
        let policy = info.on_failure;

        self.failures.push(FailureRecord {
            task: task.to_string(),
            failure: failure.clone(),
            policy,
        });

        match policy {
            FailurePolicy::Fail => {
                warn!(
                    task = %task,
                    failure = %failure,
                    "task failed; aborting run (in-flight tasks will drain)"
                );
                self.aborting = true;
            }
            FailurePolicy::Ignore => {
                warn!(
                    task = %task,
                    failure = %failure,
                    "task failed under ignore policy; its outputs will be absent"
                );
                let mut manager =
                    StateManager::new(&self.graph, &mut self.tasks, &mut self.channels);
                manager.skip_outputs(task);
            }
        }
    }

    /// Determine whether the run is finished, logging the transition.
    fn maybe_finish_run(&mut self) -> bool {
        let any_active = self
            .tasks
            .values()
            .any(|t| matches!(t.status, TaskStatus::Ready | TaskStatus::Running));
        if any_active {
            return false;
        }

        if self.aborting {
            info!("scheduler: in-flight tasks drained; run aborted");
            return true;
        }

        let blocked: Vec<&str> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Blocked)
            .map(|t| t.name.as_str())
            .collect();

        if blocked.is_empty() {
            info!("scheduler: all tasks terminal; run finished");
            true
        } else {
            // Should not happen with a validated DAG and skip propagation,
            // but finishing with a diagnostic beats hanging.
            warn!(
                ?blocked,
                "no runnable tasks remain but some are still blocked; finishing run"
            );
            true
        }
    }
}
