// tests/end_to_end_process.rs

//! End-to-end runs against real `sh` processes in a temp directory.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use gwasdag::config::PipelineFile;
use gwasdag::dag::{Scheduler, TaskStatus};
use gwasdag::engine::{
    CoreRuntime, ExecFailure, RunReport, RunStatus, Runtime, RuntimeEvent,
};
use gwasdag::exec::RealExecutorBackend;
use gwasdag::types::{ChannelKind, FailurePolicy};
use gwasdag_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

async fn run_real(cfg: &PipelineFile, run_dir: &Path) -> Result<RunReport, Box<dyn Error>> {
    let scheduler = Scheduler::from_pipeline(cfg, run_dir);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = RealExecutorBackend::new(rt_tx.clone(), cfg.pipeline.max_parallel);

    let core = CoreRuntime::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);

    match timeout(Duration::from_secs(10), runtime.run()).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => panic!("runtime did not finish within 10 seconds"),
    }
}

#[tokio::test]
async fn two_producers_feed_the_merge_union() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;

    let cfg = PipelineFileBuilder::new()
        .with_channel("fail_sets", ChannelKind::Queue)
        .with_task(
            "p1",
            TaskConfigBuilder::new("printf 'id1\nid2\nid3\n' > {ids}")
                .output("ids", "fail_sets")
                .build(),
        )
        .with_task(
            "p2",
            TaskConfigBuilder::new("printf 'id2\nid3\nid4\n' > {ids}")
                .output("ids", "fail_sets")
                .build(),
        )
        .with_task(
            "union",
            TaskConfigBuilder::merge()
                .input("sets", "fail_sets")
                .output("merged", "exclusion_list")
                .build(),
        )
        .with_task(
            "count",
            TaskConfigBuilder::new("wc -l < {exclusions} > {tally}")
                .input("exclusions", "exclusion_list")
                .output("tally", "tally_done")
                .build(),
        )
        .build();

    let report = run_real(&cfg, dir.path()).await?;
    assert_eq!(report.status, RunStatus::Succeeded);

    let merged = std::fs::read_to_string(dir.path().join("union").join("merged"))?;
    assert_eq!(merged, "id1\nid2\nid3\nid4\n");

    let tally = std::fs::read_to_string(dir.path().join("count").join("tally"))?;
    assert_eq!(tally.trim(), "4");

    Ok(())
}

#[tokio::test]
async fn value_fan_out_delivers_identical_content() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;

    let cfg = PipelineFileBuilder::new()
        .with_task(
            "source",
            TaskConfigBuilder::new("printf 'flag\n' > {out}")
                .output_fanout("out", &["left", "right"])
                .build(),
        )
        .with_task(
            "l",
            TaskConfigBuilder::new("cp {data} {copy}")
                .input("data", "left")
                .output("copy", "left_copy")
                .build(),
        )
        .with_task(
            "r",
            TaskConfigBuilder::new("cp {data} {copy}")
                .input("data", "right")
                .output("copy", "right_copy")
                .build(),
        )
        .build();

    let report = run_real(&cfg, dir.path()).await?;
    assert_eq!(report.status, RunStatus::Succeeded);

    let left = std::fs::read_to_string(dir.path().join("l").join("copy"))?;
    let right = std::fs::read_to_string(dir.path().join("r").join("copy"))?;
    assert_eq!(left, right);
    assert_eq!(left, "flag\n");

    Ok(())
}

#[tokio::test]
async fn missing_declared_output_aborts_under_fail_policy() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;

    let cfg = PipelineFileBuilder::new()
        .with_task(
            "forgetful",
            TaskConfigBuilder::new("true").output("out", "x").build(),
        )
        .with_task(
            "downstream",
            TaskConfigBuilder::new("cat {data}").input("data", "x").build(),
        )
        .build();

    let report = run_real(&cfg, dir.path()).await?;

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].task, "forgetful");
    assert_eq!(
        report.failures[0].failure,
        ExecFailure::MissingOutput("out".to_string())
    );
    assert_eq!(report.never_dispatched, ["downstream".to_string()]);

    Ok(())
}

#[tokio::test]
async fn nonzero_exit_under_ignore_policy_degrades_to_skip() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;

    let cfg = PipelineFileBuilder::new()
        .with_task(
            "flaky",
            TaskConfigBuilder::new("exit 3")
                .output("out", "x")
                .on_failure(FailurePolicy::Ignore)
                .build(),
        )
        .with_task(
            "dependent",
            TaskConfigBuilder::new("cat {data}").input("data", "x").build(),
        )
        .with_task(
            "independent",
            TaskConfigBuilder::new("printf 'ok\n' > {out}")
                .output("out", "done")
                .build(),
        )
        .build();

    let report = run_real(&cfg, dir.path()).await?;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].failure,
        ExecFailure::NonZeroExit(3)
    );
    assert_eq!(report.status_of("dependent"), Some(TaskStatus::Skipped));
    assert_eq!(
        report.status_of("independent"),
        Some(TaskStatus::Succeeded)
    );

    Ok(())
}

#[tokio::test]
async fn timeout_is_classified_and_aborts() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;

    let cfg = PipelineFileBuilder::new()
        .with_task(
            "slow",
            TaskConfigBuilder::new("sleep 30 && printf done > {out}")
                .output("out", "x")
                .timeout_secs(1)
                .build(),
        )
        .build();

    let report = run_real(&cfg, dir.path()).await?;

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].failure, ExecFailure::TimeoutExceeded);

    Ok(())
}
