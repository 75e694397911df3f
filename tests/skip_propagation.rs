// tests/skip_propagation.rs

mod common;
use crate::common::init_tracing;

use std::path::Path;

use gwasdag::dag::{Scheduler, TaskStatus};
use gwasdag::engine::{ExecFailure, RunStatus, TaskOutcome};
use gwasdag::types::{ChannelKind, FailurePolicy};
use gwasdag_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};
use gwasdag_test_utils::fake_executor::fabricate_success;

/// a (ignore) -> b -> c, with an unrelated source task d.
fn ignore_chain() -> gwasdag::config::PipelineFile {
    PipelineFileBuilder::new()
        .with_task(
            "a",
            TaskConfigBuilder::new("echo a")
                .output("out", "x")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "b",
            TaskConfigBuilder::new("cat {data}")
                .input("data", "x")
                .output("out", "y")
                .build(),
        )
        .with_task(
            "c",
            TaskConfigBuilder::new("cat {data}")
                .input("data", "y")
                .build(),
        )
        .with_task("d", TaskConfigBuilder::new("echo d").build())
        .build()
}

#[test]
fn ignored_failure_skips_consumers_transitively() {
    init_tracing();

    let cfg = ignore_chain();
    let mut scheduler = Scheduler::from_pipeline(&cfg, Path::new("run"));

    let step = scheduler.bootstrap();
    let mut names: Vec<_> = step.newly_scheduled.iter().map(|t| t.name.clone()).collect();
    names.sort();
    assert_eq!(names, ["a".to_string(), "d".to_string()]);
    let d_task = step
        .newly_scheduled
        .iter()
        .find(|t| t.name == "d")
        .expect("d scheduled")
        .clone();

    let step =
        scheduler.handle_completion("a", TaskOutcome::Failed(ExecFailure::NonZeroExit(2)));

    // Direct and transitive consumers degrade to Skipped, not Blocked.
    let mut skipped = step.newly_skipped.clone();
    skipped.sort();
    assert_eq!(skipped, ["b".to_string(), "c".to_string()]);
    assert_eq!(scheduler.status_of("b"), Some(TaskStatus::Skipped));
    assert_eq!(scheduler.status_of("c"), Some(TaskStatus::Skipped));

    // The unrelated task is unaffected and the run still terminates.
    assert!(!step.run_finished);
    let step = scheduler.handle_completion("d", fabricate_success(&d_task));
    assert!(step.run_finished);

    let report = scheduler.report();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].task, "a");
    assert_eq!(report.failures[0].policy, FailurePolicy::Ignore);
    assert!(report.never_dispatched.is_empty());
}

#[test]
fn queue_with_no_items_skips_its_consumer() {
    init_tracing();

    // Both producers of the queue fail under ignore; the merge consumer
    // must reach Skipped rather than hang.
    let cfg = PipelineFileBuilder::new()
        .with_channel("sets", ChannelKind::Queue)
        .with_task(
            "p1",
            TaskConfigBuilder::new("echo p1")
                .output("ids", "sets")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "p2",
            TaskConfigBuilder::new("echo p2")
                .output("ids", "sets")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "m",
            TaskConfigBuilder::merge()
                .input("sets", "sets")
                .output("merged", "exclusions")
                .build(),
        )
        .build();

    let mut scheduler = Scheduler::from_pipeline(&cfg, Path::new("run"));
    let step = scheduler.bootstrap();
    assert_eq!(step.newly_scheduled.len(), 2);

    let step =
        scheduler.handle_completion("p1", TaskOutcome::Failed(ExecFailure::NonZeroExit(1)));
    // One producer still pending; the queue is not settled yet.
    assert!(step.newly_skipped.is_empty());
    assert_eq!(scheduler.status_of("m"), Some(TaskStatus::Blocked));

    let step =
        scheduler.handle_completion("p2", TaskOutcome::Failed(ExecFailure::NonZeroExit(1)));
    assert_eq!(step.newly_skipped, ["m".to_string()]);
    assert!(step.run_finished);
    assert_eq!(scheduler.report().status, RunStatus::Succeeded);
}

#[test]
fn queue_consumer_runs_when_some_producers_delivered() {
    init_tracing();

    // One producer fails under ignore, one succeeds; the consumer runs
    // with the single delivered item.
    let cfg = PipelineFileBuilder::new()
        .with_channel("sets", ChannelKind::Queue)
        .with_task(
            "p1",
            TaskConfigBuilder::new("echo p1")
                .output("ids", "sets")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "p2",
            TaskConfigBuilder::new("echo p2")
                .output("ids", "sets")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "m",
            TaskConfigBuilder::merge()
                .input("sets", "sets")
                .output("merged", "exclusions")
                .build(),
        )
        .build();

    let mut scheduler = Scheduler::from_pipeline(&cfg, Path::new("run"));
    let step = scheduler.bootstrap();
    let p2 = step
        .newly_scheduled
        .iter()
        .find(|t| t.name == "p2")
        .expect("p2 scheduled")
        .clone();

    scheduler.handle_completion("p1", TaskOutcome::Failed(ExecFailure::NonZeroExit(1)));
    let step = scheduler.handle_completion("p2", fabricate_success(&p2));

    assert_eq!(step.newly_scheduled.len(), 1);
    let merge_task = &step.newly_scheduled[0];
    assert_eq!(merge_task.name, "m");
    assert_eq!(merge_task.input_paths.len(), 1);
}
