//! Middleware wrapped around every node run.
//!
//! Passed at compile time (`compile_with_middleware`). Used for cross-cutting
//! concerns such as stamping the current node id into the state and logging.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::Next;

/// Boxed future returned by the inner node call.
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

/// Inner call handed to middleware; invoking it runs the wrapped node once.
pub type NodeCall<S> = Box<dyn FnOnce(S) -> NodeFuture<S> + Send>;

/// Wraps node execution. Implementations must call `inner` at most once so that
/// exactly one executor runs per step.
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeCall<S>,
    ) -> Result<(S, Next), AgentError>;
}
