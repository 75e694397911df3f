#![allow(dead_code)]

use std::collections::BTreeMap;

use gwasdag::config::{
    ChannelConfig, ChannelList, PipelineFile, PipelineSection, RawPipelineFile, TaskConfig,
};
use gwasdag::types::{ChannelKind, FailurePolicy, TaskKind};

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineFileBuilder {
    raw: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawPipelineFile {
                pipeline: PipelineSection::default(),
                params: BTreeMap::new(),
                channel: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(name.to_string(), task);
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.raw.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_channel(mut self, name: &str, kind: ChannelKind) -> Self {
        self.raw
            .channel
            .insert(name.to_string(), ChannelConfig { kind });
        self
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.raw.pipeline.max_parallel = n;
        self
    }

    pub fn with_run_dir(mut self, dir: &str) -> Self {
        self.raw.pipeline.run_dir = dir.to_string();
        self
    }

    /// The raw, unvalidated definition (for tests asserting validation
    /// failures).
    pub fn build_raw(self) -> RawPipelineFile {
        self.raw
    }

    pub fn build(self) -> PipelineFile {
        PipelineFile::try_from(self.raw).expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                kind: TaskKind::Command,
                cmd: Some(cmd.to_string()),
                inputs: BTreeMap::new(),
                optional_inputs: BTreeMap::new(),
                outputs: BTreeMap::new(),
                on_failure: FailurePolicy::default(),
                timeout_secs: None,
            },
        }
    }

    /// Builder for a built-in merge task.
    pub fn merge() -> Self {
        Self {
            task: TaskConfig {
                kind: TaskKind::Merge,
                cmd: None,
                inputs: BTreeMap::new(),
                optional_inputs: BTreeMap::new(),
                outputs: BTreeMap::new(),
                on_failure: FailurePolicy::default(),
                timeout_secs: None,
            },
        }
    }

    pub fn input(mut self, param: &str, channel: &str) -> Self {
        self.task
            .inputs
            .insert(param.to_string(), channel.to_string());
        self
    }

    pub fn optional_input(mut self, param: &str, channel: &str) -> Self {
        self.task
            .optional_inputs
            .insert(param.to_string(), channel.to_string());
        self
    }

    pub fn output(mut self, name: &str, channel: &str) -> Self {
        self.task
            .outputs
            .insert(name.to_string(), ChannelList::One(channel.to_string()));
        self
    }

    /// Fan one output into several channels.
    pub fn output_fanout(mut self, name: &str, channels: &[&str]) -> Self {
        self.task.outputs.insert(
            name.to_string(),
            ChannelList::Many(channels.iter().map(|c| c.to_string()).collect()),
        );
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.task.on_failure = policy;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.task.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
