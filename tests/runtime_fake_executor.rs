// tests/runtime_fake_executor.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use gwasdag::config::PipelineFile;
use gwasdag::dag::{ScheduledTask, Scheduler, TaskStatus};
use gwasdag::engine::{CoreRuntime, ExecFailure, RunReport, RunStatus, Runtime, RuntimeEvent};
use gwasdag::types::ChannelKind;
use gwasdag_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};
use gwasdag_test_utils::fake_executor::FakeExecutor;

type TestResult = Result<(), Box<dyn Error>>;

/// Very simple chain, wired through channels: a -> b -> c.
fn simple_chain_config() -> PipelineFile {
    PipelineFileBuilder::new()
        .with_task(
            "a",
            TaskConfigBuilder::new("echo a").output("out", "x").build(),
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
        .build()
}

/// Run a pipeline to completion against a fake executor, returning the
/// report and the recorded dispatches.
async fn run_with_fake(
    cfg: &PipelineFile,
    make_executor: impl FnOnce(mpsc::Sender<RuntimeEvent>, Arc<Mutex<Vec<ScheduledTask>>>) -> FakeExecutor,
) -> Result<(RunReport, Vec<ScheduledTask>), Box<dyn Error>> {
    let scheduler = Scheduler::from_pipeline(cfg, Path::new("run"));

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = make_executor(rt_tx.clone(), executed.clone());

    let core = CoreRuntime::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);

    // Enforce an upper bound on how long the run may take.
    let report = match timeout(Duration::from_secs(3), runtime.run()).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    };

    let executed = executed.lock().unwrap().clone();
    Ok((report, executed))
}

#[tokio::test]
async fn runtime_with_fake_executor_runs_simple_chain() -> TestResult {
    init_tracing();

    let cfg = simple_chain_config();
    let (report, executed) = run_with_fake(&cfg, FakeExecutor::new).await?;

    let names: Vec<_> = executed.iter().map(|t| t.name.clone()).collect();
    assert_eq!(
        names,
        ["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert_eq!(report.status, RunStatus::Succeeded);

    Ok(())
}

/// End-to-end shape from the QC pipelines: stage1 fans a value channel out
/// to stage2 and stage3; both feed a queue; stage4 consumes the batch.
#[tokio::test]
async fn value_fanout_into_queue_fan_in() -> TestResult {
    init_tracing();

    let cfg = PipelineFileBuilder::new()
        .with_channel("y", ChannelKind::Queue)
        .with_task(
            "stage1",
            TaskConfigBuilder::new("echo 1").output("data", "x").build(),
        )
        .with_task(
            "stage2",
            TaskConfigBuilder::new("cat {data}")
                .input("data", "x")
                .output("ids", "y")
                .build(),
        )
        .with_task(
            "stage3",
            TaskConfigBuilder::new("cat {data}")
                .input("data", "x")
                .output("ids", "y")
                .build(),
        )
        .with_task(
            "stage4",
            TaskConfigBuilder::new("cat {items}")
                .input("items", "y")
                .build(),
        )
        .build();

    let (report, executed) = run_with_fake(&cfg, FakeExecutor::new).await?;
    assert_eq!(report.status, RunStatus::Succeeded);

    let names: Vec<_> = executed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names[0], "stage1");
    assert_eq!(names[3], "stage4");
    // stage2 and stage3 run in either order between them.
    let mut middle = [names[1], names[2]];
    middle.sort();
    assert_eq!(middle, ["stage2", "stage3"]);

    // Both fan-out consumers observed the identical upstream artifact.
    let stage2 = executed.iter().find(|t| t.name == "stage2").unwrap();
    let stage3 = executed.iter().find(|t| t.name == "stage3").unwrap();
    assert_eq!(stage2.bindings.get("data"), stage3.bindings.get("data"));

    // The fan-in consumer saw exactly 2 queue items.
    let stage4 = executed.iter().find(|t| t.name == "stage4").unwrap();
    assert_eq!(stage4.input_paths.len(), 2);

    Ok(())
}

#[tokio::test]
async fn fail_policy_failure_aborts_the_run() -> TestResult {
    init_tracing();

    let cfg = simple_chain_config();
    let (report, executed) = run_with_fake(&cfg, |tx, executed| {
        FakeExecutor::new(tx, executed).with_failure("b", ExecFailure::NonZeroExit(1))
    })
    .await?;

    let names: Vec<_> = executed.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, ["a".to_string(), "b".to_string()]);

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.status_of("c"), Some(TaskStatus::Blocked));
    assert_eq!(report.never_dispatched, ["c".to_string()]);

    Ok(())
}
