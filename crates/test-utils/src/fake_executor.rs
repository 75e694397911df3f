use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use gwasdag::artifact::Artifact;
use gwasdag::dag::ScheduledTask;
use gwasdag::engine::{ExecFailure, RuntimeEvent, TaskOutcome};
use gwasdag::errors::Result;
use gwasdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records every `ScheduledTask` it was handed
/// - immediately reports `TaskCompleted` for each, fabricating artifacts
///   for the declared outputs (or a configured failure).
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledTask>>>,
    failures: HashMap<String, ExecFailure>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledTask>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    /// Make the named task fail with the given classification instead of
    /// succeeding.
    pub fn with_failure(mut self, task: &str, failure: ExecFailure) -> Self {
        self.failures.insert(task.to_string(), failure);
        self
    }

    fn outcome_for(&self, task: &ScheduledTask) -> TaskOutcome {
        if let Some(failure) = self.failures.get(&task.name) {
            return TaskOutcome::Failed(failure.clone());
        }
        fabricate_success(task)
    }
}

/// Fabricate a success outcome with an artifact for every declared output,
/// without touching the filesystem.
///
/// Same task + output name => same fabricated checksum, so fan-out
/// consumers can assert content equality.
pub fn fabricate_success(task: &ScheduledTask) -> TaskOutcome {
    let artifacts = task
        .outputs
        .iter()
        .map(|out| {
            let checksum = format!("fake-{}-{}", task.name, out.name);
            (out.name.clone(), Artifact::new(out.path.clone(), checksum))
        })
        .collect();

    TaskOutcome::Success { artifacts }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let outcomes: Vec<(String, TaskOutcome)> = tasks
            .iter()
            .map(|t| (t.name.clone(), self.outcome_for(t)))
            .collect();

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.extend(tasks);
            }

            for (task, outcome) in outcomes {
                tx.send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
