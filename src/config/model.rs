// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ChannelKind, FailurePolicy, TaskKind};

/// Top-level pipeline definition as read from a TOML file, unvalidated.
///
/// ```toml
/// [pipeline]
/// name = "gwas-qc"
/// max_parallel = 4
/// run_dir = "runs/gwas-qc"
///
/// [params]
/// maf_min = "0.01"
///
/// [channel.fail_sets]
/// kind = "queue"
///
/// [task.check_sex]
/// cmd = "plink --bfile {genotypes} --check-sex --out {report}"
/// inputs = { genotypes = "raw_fileset" }
/// outputs = { report = ["sexcheck_report"] }
/// on_failure = "fail"
/// ```
///
/// All sections are optional and have reasonable defaults, except that at
/// least one `[task.<name>]` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    /// Global run settings from `[pipeline]`.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Scalar parameters from `[params]`, passed through to command
    /// templates untouched.
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Channel declarations from `[channel.<name>]`.
    ///
    /// Channels only need a section when they are not plain value channels;
    /// undeclared channels referenced by task outputs default to
    /// `kind = "value"`.
    #[serde(default)]
    pub channel: BTreeMap<String, ChannelConfig>,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated pipeline definition.
///
/// Constructed only via `TryFrom<RawPipelineFile>` (see `config::validate`),
/// so holding one means the task/channel graph is a DAG with sound channel
/// bindings.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub pipeline: PipelineSection,
    pub params: BTreeMap<String, String>,
    pub channel: BTreeMap<String, ChannelConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(
        pipeline: PipelineSection,
        params: BTreeMap<String, String>,
        channel: BTreeMap<String, ChannelConfig>,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            pipeline,
            params,
            channel,
            task,
        }
    }

    /// Kind of the named channel; undeclared channels are value channels.
    pub fn channel_kind(&self, name: &str) -> ChannelKind {
        self.channel.get(name).map(|c| c.kind).unwrap_or_default()
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Name of the pipeline, used in logs only.
    #[serde(default = "default_name")]
    pub name: String,

    /// Engine-wide concurrency limit for external processes.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Working directory root; each task gets `<run_dir>/<task>/`.
    #[serde(default = "default_run_dir")]
    pub run_dir: String,
}

fn default_name() -> String {
    "pipeline".to_string()
}

fn default_max_parallel() -> usize {
    4
}

fn default_run_dir() -> String {
    "runs".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_parallel: default_max_parallel(),
            run_dir: default_run_dir(),
        }
    }
}

/// `[channel.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChannelConfig {
    /// `"value"` (default) or `"queue"`.
    #[serde(default)]
    pub kind: ChannelKind,
}

/// One or more channel names, so both forms parse:
///
/// ```toml
/// outputs = { report = "sexcheck_report" }
/// outputs = { fileset = ["qc_fileset", "assoc_fileset"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelList {
    One(String),
    Many(Vec<String>),
}

impl ChannelList {
    pub fn names(&self) -> &[String] {
        match self {
            ChannelList::One(name) => std::slice::from_ref(name),
            ChannelList::Many(names) => names.as_slice(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// `"command"` (default) or `"merge"`.
    #[serde(default)]
    pub kind: TaskKind,

    /// The command template to execute. Required for command tasks,
    /// forbidden for merge tasks.
    ///
    /// `{name}` placeholders resolve to input artifact paths, output file
    /// paths and `[params]` values. Unknown placeholders are left alone so
    /// shell constructs like `awk '{print $1}'` survive.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Required inputs: template parameter name → channel name.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,

    /// Zero-or-one inputs: bound if the channel is ready at dispatch time,
    /// otherwise resolved to the empty string. Never gate readiness.
    #[serde(default)]
    pub optional_inputs: BTreeMap<String, String>,

    /// Declared outputs: output name → channel(s) the produced artifact is
    /// published into. Listing several channels fans the same artifact out
    /// to independent consumers.
    #[serde(default)]
    pub outputs: BTreeMap<String, ChannelList>,

    /// `"fail"` (default) or `"ignore"`.
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Optional wall-clock limit for the external process, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TaskConfig {
    /// All input bindings as `(param, channel, optional)`.
    pub fn input_bindings(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.inputs
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str(), false))
            .chain(
                self.optional_inputs
                    .iter()
                    .map(|(p, c)| (p.as_str(), c.as_str(), true)),
            )
    }

    /// All channel names this task publishes into.
    pub fn output_channels(&self) -> impl Iterator<Item = &str> {
        self.outputs
            .values()
            .flat_map(|list| list.names().iter().map(|s| s.as_str()))
    }
}
