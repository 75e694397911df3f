// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::{GwasdagError, Result};
use crate::types::{ChannelKind, TaskKind};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = crate::errors::GwasdagError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw(&raw)?;
        Ok(PipelineFile::new_unchecked(
            raw.pipeline,
            raw.params,
            raw.channel,
            raw.task,
        ))
    }
}

fn validate_raw(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_pipeline_section(cfg)?;
    validate_task_shapes(cfg)?;

    let topo = channel_topology(cfg);
    validate_channels(cfg, &topo)?;
    validate_dag(cfg, &topo)?;
    Ok(())
}

/// Producers and consumers of one channel, as declared across all tasks.
struct ChannelUse<'a> {
    kind: ChannelKind,
    producers: Vec<&'a str>,
    consumers: Vec<&'a str>,
}

fn channel_topology<'a>(cfg: &'a RawPipelineFile) -> BTreeMap<&'a str, ChannelUse<'a>> {
    fn entry<'a, 'b>(
        topo: &'b mut BTreeMap<&'a str, ChannelUse<'a>>,
        cfg: &'a RawPipelineFile,
        name: &'a str,
    ) -> &'b mut ChannelUse<'a> {
        topo.entry(name).or_insert_with(|| ChannelUse {
            kind: cfg.channel.get(name).map(|c| c.kind).unwrap_or_default(),
            producers: Vec::new(),
            consumers: Vec::new(),
        })
    }

    let mut topo: BTreeMap<&str, ChannelUse<'_>> = BTreeMap::new();

    // Declared channels first, so unused declarations still show up.
    for name in cfg.channel.keys() {
        entry(&mut topo, cfg, name.as_str());
    }

    for (task_name, task) in cfg.task.iter() {
        for channel in task.output_channels() {
            entry(&mut topo, cfg, channel).producers.push(task_name.as_str());
        }
        for (_, channel, _) in task.input_bindings() {
            entry(&mut topo, cfg, channel).consumers.push(task_name.as_str());
        }
    }

    topo
}

fn ensure_has_tasks(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(GwasdagError::ConfigError(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.pipeline.max_parallel == 0 {
        return Err(GwasdagError::ConfigError(
            "[pipeline].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_shapes(cfg: &RawPipelineFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        match task.kind {
            TaskKind::Command => {
                if task.cmd.is_none() {
                    return Err(GwasdagError::ConfigError(format!(
                        "task '{}' is a command task but has no `cmd`",
                        name
                    )));
                }
            }
            TaskKind::Merge => {
                if task.cmd.is_some() {
                    return Err(GwasdagError::ConfigError(format!(
                        "task '{}' is a merge task and must not declare `cmd`",
                        name
                    )));
                }
                if task.inputs.is_empty() {
                    return Err(GwasdagError::ConfigError(format!(
                        "merge task '{}' must declare at least one input",
                        name
                    )));
                }
                if task.outputs.len() != 1 {
                    return Err(GwasdagError::ConfigError(format!(
                        "merge task '{}' must declare exactly one output (got {})",
                        name,
                        task.outputs.len()
                    )));
                }
            }
        }

        for param in task.inputs.keys() {
            if task.optional_inputs.contains_key(param) {
                return Err(GwasdagError::ConfigError(format!(
                    "task '{}' declares '{}' both in `inputs` and `optional_inputs`",
                    name, param
                )));
            }
        }

        // No self-loops: a task must not consume a channel it produces.
        for (_, input_channel, _) in task.input_bindings() {
            if task.output_channels().any(|out| out == input_channel) {
                return Err(GwasdagError::ConfigError(format!(
                    "task '{}' consumes channel '{}' that it also produces (self-loop)",
                    name, input_channel
                )));
            }
        }
    }
    Ok(())
}

fn validate_channels(
    _cfg: &RawPipelineFile,
    topo: &BTreeMap<&str, ChannelUse<'_>>,
) -> Result<()> {
    for (name, chan) in topo.iter() {
        if !chan.consumers.is_empty() && chan.producers.is_empty() {
            return Err(GwasdagError::DanglingChannelReference(format!(
                "channel '{}' is consumed by {:?} but no task produces it",
                name, chan.consumers
            )));
        }

        if chan.kind == ChannelKind::Value && chan.producers.len() > 1 {
            return Err(GwasdagError::ConfigError(format!(
                "value channel '{}' has multiple producers {:?}; only queue channels may fan in",
                name, chan.producers
            )));
        }

        // Unconsumed outputs are legal (a pipeline may end in a report file),
        // but worth flagging.
        if !chan.producers.is_empty() && chan.consumers.is_empty() {
            warn!(channel = %name, producers = ?chan.producers, "output channel has no consumers");
        }
        if chan.producers.is_empty() && chan.consumers.is_empty() {
            warn!(channel = %name, "declared channel is neither produced nor consumed");
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawPipelineFile, topo: &BTreeMap<&str, ChannelUse<'_>>) -> Result<()> {
    // Edge direction: producer -> consumer, one edge per shared channel.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for chan in topo.values() {
        for &producer in &chan.producers {
            for &consumer in &chan.consumers {
                if producer != consumer {
                    graph.add_edge(producer, consumer, ());
                }
            }
        }
    }

    // A topological sort fails iff there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(GwasdagError::CyclicDependency(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}
