//! Graph execution error types.
//!
//! Returned by `Node::run` and by `CompiledStateGraph::invoke` when a step cannot
//! complete. Domain nodes record recoverable failures inside the state instead
//! of returning these; an `AgentError` means the run itself could not continue.

use thiserror::Error;

use crate::memory::CheckpointError;

/// Graph execution error.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. node fault that was not absorbed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A router returned an exit name that is not in the node's path map.
    /// This is a graph configuration error and is never retried.
    #[error("node '{node}' routed to unknown exit '{route}'")]
    UnknownRoute { node: String, route: String },

    /// A jump or resume targeted a node id the graph does not contain.
    #[error("node not found at runtime: {0}")]
    NodeNotFound(String),

    /// The run exceeded the configured number of steps without reaching END or an interrupt.
    #[error("recursion limit of {0} steps reached")]
    RecursionLimit(usize),

    /// Saving the per-step checkpoint failed.
    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display format of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("msg".to_string());
        let s = err.to_string();
        assert!(
            s.contains("execution failed"),
            "Display should contain 'execution failed': {}",
            s
        );
        assert!(s.contains("msg"), "Display should contain message: {}", s);
    }

    /// **Scenario**: UnknownRoute names both the node and the offending exit.
    #[test]
    fn agent_error_display_unknown_route() {
        let err = AgentError::UnknownRoute {
            node: "null_check".into(),
            route: "nowhere".into(),
        };
        let s = err.to_string();
        assert!(s.contains("null_check"), "{}", s);
        assert!(s.contains("nowhere"), "{}", s);
    }

    /// **Scenario**: Debug format includes variant name.
    #[test]
    fn agent_error_debug_format() {
        let err = AgentError::RecursionLimit(7);
        let s = format!("{:?}", err);
        assert!(s.contains("RecursionLimit"), "{}", s);
        assert!(s.contains('7'), "{}", s);
    }
}
