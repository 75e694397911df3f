// src/config/mod.rs

//! Pipeline definition loading and validation.
//!
//! - [`model`] maps the TOML definition file onto Rust types.
//! - [`loader`] reads and deserializes the file.
//! - [`validate`] turns a [`model::RawPipelineFile`] into a validated
//!   [`model::PipelineFile`], rejecting cyclic graphs, dangling channel
//!   references and malformed task declarations before anything runs.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_pipeline_path, load_and_validate, load_from_path};
pub use model::{
    ChannelConfig, ChannelList, PipelineFile, PipelineSection, RawPipelineFile, TaskConfig,
};
