// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GwasdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in task DAG: {0}")]
    CyclicDependency(String),

    #[error("Dangling channel reference: {0}")]
    DanglingChannelReference(String),

    #[error("Run aborted: {0}")]
    RunAborted(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GwasdagError>;
