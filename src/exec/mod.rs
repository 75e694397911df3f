// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is the sole boundary to PLINK, R, Perl and any other
//! external tool the pipeline invokes: resolve a command template, run it
//! with `tokio::process::Command`, wait, collect the declared output files,
//! and report back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.
//! - [`executor_loop`] owns the background executor loop which manages task
//!   processes under the engine-wide concurrency limit.
//! - [`task_runner`] handles individual task execution and outcome
//!   classification.
//! - [`template`] resolves `{name}` placeholders in command templates.
//! - [`merge`] implements the built-in identifier-list union task.

pub mod backend;
pub mod executor_loop;
pub mod merge;
pub mod task_runner;
pub mod template;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
