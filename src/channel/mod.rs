// src/channel/mod.rs

//! Channel state arena.
//!
//! Channels are the only mutable shared state of a run, and they are only
//! ever mutated by the scheduler on behalf of completed tasks. A channel is
//! a named conduit between one (value) or more (queue) producing tasks and
//! any number of consuming tasks:
//!
//! - **value**: a single artifact, broadcast. `Empty` until the producer
//!   completes, then `Ready` with a shared handle every consumer can read
//!   repeatedly, or `Skipped` if the producer failed under an ignore policy.
//! - **queue**: a FIFO fed by several producers. Consumers take the whole
//!   batch, but only once every producer has reached a terminal state, so
//!   no item can arrive after a consumer ran.
//!
//! Artifacts are held behind `Arc` so fan-out consumers all observe the
//! identical underlying data rather than copies.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::types::ChannelKind;

pub type ChannelName = String;

/// State of a value channel.
#[derive(Debug, Clone)]
pub enum ValueState {
    /// The producer has not reached a terminal state yet.
    Empty,
    /// The producer completed; the artifact is readable by every consumer.
    Ready(Arc<Artifact>),
    /// The producer failed under an ignore policy (or was itself skipped);
    /// the artifact will never exist.
    Skipped,
}

/// Mutable per-run state of one channel.
#[derive(Debug, Clone)]
struct ChannelState {
    kind: ChannelKind,
    /// Value channels only.
    value: ValueState,
    /// Queue channels only.
    items: Vec<Arc<Artifact>>,
    /// Producers that have not reached a terminal state yet.
    producers_remaining: usize,
}

/// Arena of channel states, indexed by channel name.
#[derive(Debug)]
pub struct ChannelStore {
    channels: HashMap<ChannelName, ChannelState>,
}

impl ChannelStore {
    /// Create the store from the channel topology: `(name, kind, producer count)`.
    pub fn new<'a>(topology: impl Iterator<Item = (&'a str, ChannelKind, usize)>) -> Self {
        let channels = topology
            .map(|(name, kind, producers)| {
                (
                    name.to_string(),
                    ChannelState {
                        kind,
                        value: ValueState::Empty,
                        items: Vec::new(),
                        producers_remaining: producers,
                    },
                )
            })
            .collect();
        Self { channels }
    }

    pub fn kind_of(&self, name: &str) -> Option<ChannelKind> {
        self.channels.get(name).map(|c| c.kind)
    }

    /// Publish a completed producer's artifact into the channel.
    ///
    /// Called by the scheduler strictly after the executor reported success,
    /// once per `(output, channel)` binding; fanning one output into K
    /// channels publishes K clones of the same `Arc` handle.
    pub fn publish(&mut self, name: &str, artifact: Arc<Artifact>) {
        let Some(chan) = self.channels.get_mut(name) else {
            warn!(channel = %name, "publish into unknown channel; ignoring");
            return;
        };

        match chan.kind {
            ChannelKind::Value => match chan.value {
                ValueState::Empty => {
                    debug!(channel = %name, path = ?artifact.path(), "value channel ready");
                    chan.value = ValueState::Ready(artifact);
                }
                // Single-writer is enforced at validation; a second publish
                // would mean a scheduler bug.
                ValueState::Ready(_) | ValueState::Skipped => {
                    warn!(channel = %name, "value channel already settled; dropping publish");
                }
            },
            ChannelKind::Queue => {
                debug!(channel = %name, path = ?artifact.path(), "queue channel received item");
                chan.items.push(artifact);
            }
        }
    }

    /// Record that one producer of this channel reached a terminal state,
    /// whether or not it published anything.
    pub fn producer_finished(&mut self, name: &str) {
        if let Some(chan) = self.channels.get_mut(name) {
            chan.producers_remaining = chan.producers_remaining.saturating_sub(1);
        }
    }

    /// Mark a value channel as never going to be filled.
    ///
    /// Queue channels need no marking: a skipped producer simply never
    /// pushes, and settlement is tracked via `producer_finished`.
    pub fn mark_skipped(&mut self, name: &str) {
        if let Some(chan) = self.channels.get_mut(name) {
            if chan.kind == ChannelKind::Value {
                if let ValueState::Empty = chan.value {
                    chan.value = ValueState::Skipped;
                }
            }
        }
    }

    /// State of a value channel. `None` for unknown or queue channels.
    pub fn value_state(&self, name: &str) -> Option<&ValueState> {
        let chan = self.channels.get(name)?;
        match chan.kind {
            ChannelKind::Value => Some(&chan.value),
            ChannelKind::Queue => None,
        }
    }

    /// Whether every producer of the channel has reached a terminal state.
    pub fn settled(&self, name: &str) -> bool {
        self.channels
            .get(name)
            .map(|c| c.producers_remaining == 0)
            .unwrap_or(false)
    }

    /// Current queue items. Empty for value channels.
    pub fn queue_items(&self, name: &str) -> &[Arc<Artifact>] {
        self.channels
            .get(name)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }
}
