//! Node executors and their adapter onto the graph engine.
//!
//! An executor is domain logic: read the state, maybe call the model, return a
//! [`StateUpdate`]. [`ExecutorNode`] wraps it as a `Node<WorkflowState>`: it
//! merges the update, turns faults into error records plus a bounded
//! re-invocation of the same node, and decides interrupt / end / continue.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::AgentError;
use crate::gateway::{call_with_retry, ModelGateway, ModelOutcome, ModelRequest};
use crate::graph::{Next, Node};

use super::config::WorkflowConfig;
use super::state::{Phase, WorkflowErrorRecord, WorkflowState};
use super::update::StateUpdate;

/// Internal failure of an executor. Model failures never surface as faults;
/// executors absorb them with a fallback.
#[derive(Debug, Error)]
pub enum ExecutorFault {
    #[error("executor fault: {0}")]
    Internal(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shared dependencies of all executors of one orchestrator.
pub struct ExecutorContext {
    pub gateway: Arc<dyn ModelGateway>,
    pub config: WorkflowConfig,
}

impl ExecutorContext {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: WorkflowConfig) -> Self {
        Self { gateway, config }
    }

    /// Model call through the retry & fallback controller.
    pub async fn call<T: DeserializeOwned>(&self, request: ModelRequest) -> ModelOutcome<T> {
        call_with_retry(self.gateway.as_ref(), &request, &self.config.retry_policy).await
    }
}

/// One pipeline step.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Node id the executor is registered under.
    fn id(&self) -> &'static str;

    /// Computes the update for `state`. Must not panic on model failures.
    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault>;

    /// Whether the run suspends after this executor's update was merged.
    fn suspend_after(&self, _state: &WorkflowState) -> bool {
        false
    }
}

/// Adapts a [`NodeExecutor`] to the graph engine.
pub struct ExecutorNode {
    executor: Arc<dyn NodeExecutor>,
    max_retries: u32,
}

impl ExecutorNode {
    pub fn new(executor: Arc<dyn NodeExecutor>, max_retries: u32) -> Self {
        Self {
            executor,
            max_retries,
        }
    }
}

#[async_trait]
impl Node<WorkflowState> for ExecutorNode {
    fn id(&self) -> &str {
        self.executor.id()
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next), AgentError> {
        let id = self.executor.id();
        match self.executor.execute(&state).await {
            Ok(update) => {
                state.apply(update);
                if let Err(violation) = state.check_invariants() {
                    tracing::warn!(node = id, %violation, "state invariant violated");
                }
                if self.executor.suspend_after(&state) {
                    return Ok((state, Next::Interrupt));
                }
                if state.phase.is_terminal() {
                    return Ok((state, Next::End));
                }
                Ok((state, Next::Continue))
            }
            Err(fault) => {
                if state.retry_count < self.max_retries {
                    tracing::warn!(node = id, attempt = state.retry_count + 1, error = %fault, "node fault, retrying");
                    let update = StateUpdate {
                        retry_count: Some(state.retry_count + 1),
                        ..StateUpdate::new()
                    }
                    .with_error(WorkflowErrorRecord::recoverable(
                        "node_fault",
                        id,
                        fault.to_string(),
                    ));
                    state.apply(update);
                    Ok((state, Next::Node(id.to_string())))
                } else {
                    tracing::error!(node = id, error = %fault, "node fault, retries exhausted");
                    let update = StateUpdate {
                        phase: Some(Phase::Error),
                        ..StateUpdate::new()
                    }
                    .with_error(WorkflowErrorRecord::fatal(
                        "node_fault",
                        id,
                        fault.to_string(),
                    ));
                    state.apply(update);
                    Ok((state, Next::End))
                }
            }
        }
    }
}
