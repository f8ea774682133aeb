//! Node middleware for the workflow graph: stamps `state.node` and traces each step.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::error::AgentError;
use crate::graph::{Next, NodeCall, NodeMiddleware};

use super::state::WorkflowState;

/// Records the executed node id in the state and emits a span per node.
///
/// An optional extra middleware (e.g. a CLI progress printer) runs inside it.
#[derive(Default)]
pub struct NodeTracking {
    extra: Option<Arc<dyn NodeMiddleware<WorkflowState>>>,
}

impl NodeTracking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `extra` so it runs around every node as well.
    pub fn with_extra(extra: Arc<dyn NodeMiddleware<WorkflowState>>) -> Self {
        Self { extra: Some(extra) }
    }
}

#[async_trait]
impl NodeMiddleware<WorkflowState> for NodeTracking {
    async fn around_run(
        &self,
        node_id: &str,
        state: WorkflowState,
        inner: NodeCall<WorkflowState>,
    ) -> Result<(WorkflowState, Next), AgentError> {
        let span = tracing::info_span!("node", node = node_id, thread_id = %state.thread_id);
        let started = Instant::now();
        let result = async move {
            match &self.extra {
                Some(extra) => extra.around_run(node_id, state, inner).await,
                None => inner(state).await,
            }
        }
        .instrument(span)
        .await;

        let (mut state, next) = result?;
        state.node = node_id.to_string();
        tracing::debug!(
            node = node_id,
            phase = %state.phase,
            ?next,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "node finished"
        );
        Ok((state, next))
    }
}
