// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::Result;

/// Load a pipeline definition from a given path and return the raw
/// `RawPipelineFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (DAG correctness, channel bindings, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawPipelineFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a pipeline definition from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - dangling channel references,
///   - multiple writers on a value channel,
///   - self-loops and DAG cycles,
///   - malformed task declarations.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw = load_from_path(&path)?;
    let config = PipelineFile::try_from(raw)?;
    Ok(config)
}

/// Helper to resolve a default pipeline definition path.
///
/// Currently this just returns `Gwasdag.toml` in the current working
/// directory.
pub fn default_pipeline_path() -> PathBuf {
    PathBuf::from("Gwasdag.toml")
}
