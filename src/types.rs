use serde::Deserialize;
use std::str::FromStr;

/// What a task failure does to the rest of the run.
///
/// - `Fail`: abort the whole run; in-flight tasks drain, nothing new is
///   dispatched (default behaviour).
/// - `Ignore`: record the failure, mark the task's outputs as absent, and
///   let the rest of the graph continue. Consumers that require the absent
///   outputs are skipped, not failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    Fail,
    Ignore,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Fail
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(FailurePolicy::Fail),
            "ignore" => Ok(FailurePolicy::Ignore),
            other => Err(format!(
                "invalid on_failure: {other} (expected \"fail\" or \"ignore\")"
            )),
        }
    }
}

/// Delivery discipline of a channel.
///
/// - `Value`: a single artifact broadcast to every consumer, readable
///   repeatedly (default; flag-file semantics).
/// - `Queue`: a FIFO of artifacts fed by one or more producers; each
///   consumer takes the whole batch once all producers are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Value,
    Queue,
}

impl Default for ChannelKind {
    fn default() -> Self {
        ChannelKind::Value
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(ChannelKind::Value),
            "queue" => Ok(ChannelKind::Queue),
            other => Err(format!(
                "invalid channel kind: {other} (expected \"value\" or \"queue\")"
            )),
        }
    }
}

/// How a task produces its outputs.
///
/// - `Command`: run `cmd` as an external process (default).
/// - `Merge`: built-in set union over the identifier lists bound to the
///   task's inputs; no external process involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Command,
    Merge,
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Command
    }
}
