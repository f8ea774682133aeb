//! Structured tracing for graph execution events.
//!
//! Called by the compiled graph's run loop; everything goes through `tracing`
//! so the embedding application decides filtering and output.

use crate::error::AgentError;
use crate::graph::Next;

/// Log node execution start.
pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "node started");
}

/// Log node execution completion with the node's next-step decision.
pub fn log_node_complete(node_id: &str, next: &Next) {
    tracing::debug!(node_id = node_id, ?next, "node complete");
}

/// Log graph execution start (entry node or resume node).
pub fn log_graph_start(start_id: &str) {
    tracing::info!(start = start_id, "graph run started");
}

/// Log a run suspended by `Next::Interrupt`.
pub fn log_graph_interrupted(node_id: &str) {
    tracing::info!(node_id = node_id, "graph run interrupted");
}

pub fn log_graph_complete() {
    tracing::info!("graph run complete");
}

pub fn log_graph_error(error: &AgentError) {
    tracing::error!(%error, "graph run failed");
}
