//! Node trait: one step of a state graph.

use async_trait::async_trait;

use crate::error::AgentError;

use super::{Next, RunContext};

/// One executable step: state in, state out, plus the next-step decision.
///
/// Implementations must not hold references to the state between runs; the
/// engine owns the authoritative copy for the duration of a run.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Stable id used in logs; usually equal to the id the node is registered under.
    fn id(&self) -> &str;

    /// Runs the step.
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;

    /// Context-aware variant used when the graph is streamed. Defaults to `run`.
    async fn run_with_context(
        &self,
        state: S,
        _ctx: &RunContext<S>,
    ) -> Result<(S, Next), AgentError> {
        self.run(state).await
    }
}
