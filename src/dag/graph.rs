// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::model::PipelineFile;
use crate::types::ChannelKind;

/// Where a channel sits in the task graph.
#[derive(Debug, Clone)]
pub struct ChannelTopology {
    pub kind: ChannelKind,
    /// Tasks publishing into this channel (exactly one for value channels).
    pub producers: Vec<String>,
    /// Tasks consuming this channel.
    pub consumers: Vec<String>,
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct GraphNode {
    /// Direct dependencies: tasks producing a channel this one consumes.
    deps: Vec<String>,
    /// Direct dependents: tasks consuming a channel this one produces.
    dependents: Vec<String>,
}

/// Task dependency graph inferred from channel bindings.
///
/// An edge B -> A exists iff A consumes a channel that B produces. Built
/// once from a validated [`PipelineFile`] (acyclicity and channel soundness
/// are checked in `config::validate`) and never mutated; it is the single
/// source of truth for scheduling order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: HashMap<String, GraphNode>,
    channels: BTreeMap<String, ChannelTopology>,
}

impl DependencyGraph {
    /// Build the graph from a validated [`PipelineFile`].
    pub fn from_pipeline(cfg: &PipelineFile) -> Self {
        // First pass: channel topology from task outputs and inputs.
        let mut channels: BTreeMap<String, ChannelTopology> = BTreeMap::new();
        let mut entry = |channels: &mut BTreeMap<String, ChannelTopology>, name: &str| {
            if !channels.contains_key(name) {
                channels.insert(
                    name.to_string(),
                    ChannelTopology {
                        kind: cfg.channel_kind(name),
                        producers: Vec::new(),
                        consumers: Vec::new(),
                    },
                );
            }
        };

        for (task_name, task) in cfg.task.iter() {
            for channel in task.output_channels() {
                entry(&mut channels, channel);
                if let Some(chan) = channels.get_mut(channel) {
                    chan.producers.push(task_name.clone());
                }
            }
            for (_, channel, _) in task.input_bindings() {
                entry(&mut channels, channel);
                if let Some(chan) = channels.get_mut(channel) {
                    chan.consumers.push(task_name.clone());
                }
            }
        }

        // Second pass: adjacency, deduplicated (two tasks may share more
        // than one channel). Scoped so the borrows of `channels` end before
        // it is moved into the graph.
        let nodes = {
            let mut deps: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
            let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

            for chan in channels.values() {
                for producer in &chan.producers {
                    for consumer in &chan.consumers {
                        deps.entry(consumer).or_default().insert(producer);
                        dependents.entry(producer).or_default().insert(consumer);
                    }
                }
            }

            cfg.task
                .keys()
                .map(|name| {
                    let node = GraphNode {
                        deps: deps
                            .get(name.as_str())
                            .map(|s| s.iter().map(|d| d.to_string()).collect())
                            .unwrap_or_default(),
                        dependents: dependents
                            .get(name.as_str())
                            .map(|s| s.iter().map(|d| d.to_string()).collect())
                            .unwrap_or_default(),
                    };
                    (name.clone(), node)
                })
                .collect()
        };

        Self { nodes, channels }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// All channels with their producers and consumers.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelTopology)> {
        self.channels.iter().map(|(name, t)| (name.as_str(), t))
    }

    /// Topology of one channel.
    pub fn channel(&self, name: &str) -> Option<&ChannelTopology> {
        self.channels.get(name)
    }

    /// Kahn layering of the graph: wave N tasks only depend on tasks in
    /// earlier waves. Used by dry-run output and tests.
    pub fn topo_waves(&self) -> Vec<Vec<String>> {
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = self
            .nodes
            .iter()
            .map(|(name, node)| {
                (
                    name.as_str(),
                    node.deps.iter().map(|d| d.as_str()).collect(),
                )
            })
            .collect();

        let mut waves = Vec::new();
        while !remaining.is_empty() {
            let wave: Vec<String> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| name.to_string())
                .collect();

            // Validated graphs are acyclic, so every round frees at least
            // one task.
            if wave.is_empty() {
                break;
            }

            for name in &wave {
                remaining.remove(name.as_str());
            }
            for deps in remaining.values_mut() {
                for name in &wave {
                    deps.remove(name.as_str());
                }
            }
            waves.push(wave);
        }
        waves
    }
}
