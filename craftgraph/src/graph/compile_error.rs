//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the transition table is inconsistent:
//! an edge or path map references an unknown node, the entry is missing or
//! ambiguous, or a node has no (or conflicting) exits.

use thiserror::Error;

/// Error when compiling a state graph.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge or path map was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge has from_id == START, or more than one such edge.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// A node declares two static edges, or both a static edge and a router.
    #[error("node '{0}' has conflicting exits")]
    ConflictingExits(String),

    /// A registered node has neither a static edge nor a router.
    #[error("node '{0}' has no exit")]
    MissingExit(String),

    /// A router was registered with an empty path map.
    #[error("node '{0}' has a router with no exits")]
    EmptyPathMap(String),
}
