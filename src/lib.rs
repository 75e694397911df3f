// src/lib.rs

pub mod artifact;
pub mod channel;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PipelineFile;
use crate::dag::{DependencyGraph, Scheduler};
use crate::engine::{CoreRuntime, RunReport, RunStatus, Runtime, RuntimeEvent};
use crate::errors::{GwasdagError, Result};
use crate::exec::RealExecutorBackend;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline definition loading and validation
/// - scheduler / runtime
/// - executor
/// - Ctrl-C handling
///
/// Returns an error for an aborted run, so the binary exits non-zero.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        // Dry runs produce an empty successful report.
        return Ok(RunReport {
            status: RunStatus::Succeeded,
            task_status: Default::default(),
            failures: Vec::new(),
            never_dispatched: Vec::new(),
        });
    }

    let run_dir = args
        .run_dir
        .as_deref()
        .unwrap_or(cfg.pipeline.run_dir.as_str());
    let run_dir = PathBuf::from(run_dir);

    info!(
        pipeline = %cfg.pipeline.name,
        run_dir = %run_dir.display(),
        tasks = cfg.task.len(),
        "starting pipeline run"
    );

    let scheduler = Scheduler::from_pipeline(&cfg, &run_dir);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Process executor backend (real implementation in production).
    let executor = RealExecutorBackend::new(rt_tx.clone(), cfg.pipeline.max_parallel);

    // Ctrl-C → hard cancel.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Construct the pure core runtime (single source of truth for
    // semantics) and the async IO shell around it.
    let core = CoreRuntime::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);

    let report = runtime.run().await?;
    report.log_summary();

    match report.status {
        RunStatus::Succeeded => Ok(report),
        RunStatus::Aborted => {
            let detail = report
                .failures
                .iter()
                .map(|f| format!("task '{}' failed ({})", f.task, f.failure))
                .next()
                .unwrap_or_else(|| "cancelled".to_string());
            Err(GwasdagError::RunAborted(detail))
        }
    }
}

/// Simple dry-run output: print tasks, channel bindings and wave order.
fn print_dry_run(cfg: &PipelineFile) {
    let graph = DependencyGraph::from_pipeline(cfg);

    println!("gwasdag dry-run");
    println!("  pipeline.name = {}", cfg.pipeline.name);
    println!("  pipeline.max_parallel = {}", cfg.pipeline.max_parallel);
    println!("  pipeline.run_dir = {}", cfg.pipeline.run_dir);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        if let Some(ref cmd) = task.cmd {
            println!("      cmd: {cmd}");
        } else {
            println!("      kind: {:?}", task.kind);
        }
        for (param, channel) in task.inputs.iter() {
            println!("      in:  {param} <- {channel}");
        }
        for (param, channel) in task.optional_inputs.iter() {
            println!("      in:  {param} <- {channel} (optional)");
        }
        for (output, channels) in task.outputs.iter() {
            println!("      out: {output} -> {:?}", channels.names());
        }
        println!("      on_failure: {:?}", task.on_failure);
    }
    println!();

    println!("channels:");
    for (name, topo) in graph.channels() {
        println!(
            "  - {name} ({:?}): {:?} -> {:?}",
            topo.kind, topo.producers, topo.consumers
        );
    }
    println!();

    println!("execution waves:");
    for (i, wave) in graph.topo_waves().iter().enumerate() {
        println!("  {i}: {:?}", wave);
    }
}
