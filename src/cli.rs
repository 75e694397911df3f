// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gwasdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gwasdag",
    version,
    about = "Run a declarative QC/association pipeline as a task DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline definition file (TOML).
    ///
    /// Default: `Gwasdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Gwasdag.toml")]
    pub config: String,

    /// Working directory root for this run.
    ///
    /// Overrides `[pipeline].run_dir` from the definition file. Each task
    /// gets its own subdirectory underneath.
    #[arg(long, value_name = "DIR")]
    pub run_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GWASDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
