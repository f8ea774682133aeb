//! Progress middleware that prints node enter/exit around each node run.

use async_trait::async_trait;

use craftgraph::graph::NodeCall;
use craftgraph::{AgentError, Next, NodeMiddleware, WorkflowState};

/// Prints one line when a node starts and one when it finishes, with the phase it left.
///
/// Writes to stderr so that stdout carries only questions and results.
pub struct ProgressMiddleware;

/// Exit line for a finished node.
pub(crate) fn exit_line(node_id: &str, result: &Result<(WorkflowState, Next), AgentError>) -> String {
    match result {
        Ok((state, next)) => format!(
            "[node] exit node={} phase={} next={:?}",
            node_id, state.phase, next
        ),
        Err(e) => format!("[node] exit node={} error={}", node_id, e),
    }
}

#[async_trait]
impl NodeMiddleware<WorkflowState> for ProgressMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: WorkflowState,
        inner: NodeCall<WorkflowState>,
    ) -> Result<(WorkflowState, Next), AgentError> {
        eprintln!("[node] enter node={}", node_id);
        let result = inner(state).await;
        eprintln!("{}", exit_line(node_id, &result));
        result
    }
}
