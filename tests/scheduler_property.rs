// tests/scheduler_property.rs

//! Property test: for arbitrary DAG pipelines with arbitrary failure
//! placements and policies, a run always terminates, and no task is ever
//! dispatched twice or before its producers completed.

use std::collections::HashSet;
use std::path::Path;

use proptest::prelude::*;

use gwasdag::config::PipelineFile;
use gwasdag::dag::Scheduler;
use gwasdag::engine::{ExecFailure, TaskOutcome};
use gwasdag::types::FailurePolicy;
use gwasdag_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};
use gwasdag_test_utils::fake_executor::fabricate_success;

/// Generate a valid DAG pipeline: task N may only consume channels
/// produced by tasks 0..N-1, which guarantees acyclicity. Every task
/// produces one value channel named after it.
fn dag_pipeline_strategy(max_tasks: usize) -> impl Strategy<Value = PipelineFile> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );
        let ignore_strat = proptest::collection::vec(any::<bool>(), num_tasks);

        (deps_strat, ignore_strat).prop_map(move |(raw_deps, ignores)| {
            let mut builder = PipelineFileBuilder::new();

            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{}", i);
                let mut task = TaskConfigBuilder::new(&format!("echo {}", name))
                    .output("out", &format!("chan_{}", i));

                // Sanitize dependencies: only channels of earlier tasks.
                let mut valid_deps = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid_deps.insert(dep_idx % i);
                    }
                }
                for dep_idx in valid_deps {
                    task = task.input(
                        &format!("in_{}", dep_idx),
                        &format!("chan_{}", dep_idx),
                    );
                }

                if ignores.get(i).copied().unwrap_or(false) {
                    task = task.on_failure(FailurePolicy::Ignore);
                }

                builder = builder.with_task(&name, task.build());
            }
            builder.build()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scheduler_always_terminates(
        cfg in dag_pipeline_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..5),
    ) {
        let mut scheduler = Scheduler::from_pipeline(&cfg, Path::new("run"));
        let task_names: Vec<String> = scheduler.task_names().map(|s| s.to_string()).collect();

        let failing: HashSet<String> = failing_indices
            .iter()
            .filter(|&&i| i < task_names.len())
            .map(|&i| task_names[i].clone())
            .collect();

        let mut executing = scheduler.bootstrap().newly_scheduled;
        let mut dispatched: HashSet<String> = HashSet::new();
        for t in &executing {
            prop_assert!(dispatched.insert(t.name.clone()), "task {} dispatched twice", t.name);
        }

        let mut steps = 0;
        let max_steps = 1000;

        while !executing.is_empty() && steps < max_steps {
            steps += 1;

            let task = executing.remove(0);
            let outcome = if failing.contains(&task.name) {
                TaskOutcome::Failed(ExecFailure::NonZeroExit(1))
            } else {
                fabricate_success(&task)
            };

            let step = scheduler.handle_completion(&task.name, outcome);
            for t in step.newly_scheduled {
                prop_assert!(
                    dispatched.insert(t.name.clone()),
                    "task {} dispatched twice",
                    t.name
                );
                executing.push(t);
            }
        }

        prop_assert!(steps < max_steps, "simulation timed out - infinite loop?");

        // Once nothing is executing, the run must have reached a terminal
        // state: every task Succeeded/Failed/Skipped, or the run aborted.
        prop_assert!(scheduler.is_finished(), "scheduler stuck with nothing executing");
    }
}
