//! Shared helpers for workflow integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use craftgraph::graph::NodeCall;
use craftgraph::{
    AgentError, InMemoryStore, MockGateway, Next, NodeMiddleware, Orchestrator, RetryPolicy,
    Store, WorkflowConfig, WorkflowState,
};

/// Extraction reply: plastic bottles with size and material, but no fastener.
pub const BOTTLES_ONLY: &str = r#"{"ingredients":[
    {"name":"water bottles","size":"500 ml","material":"plastic","category":"container","confidence":0.9}
]}"#;

/// Extraction reply: a complete container and a complete fastener.
pub const BOTTLES_AND_TWINE: &str = r#"{"ingredients":[
    {"name":"water bottles","size":"500 ml","material":"plastic","category":"container","confidence":0.9},
    {"name":"twine","size":"5 m","material":"jute","category":"fastener","confidence":0.8}
]}"#;

/// Config that never sleeps between model retries.
pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        retry_policy: RetryPolicy::immediate(1),
        ..WorkflowConfig::default()
    }
}

pub fn orchestrator(mock: &Arc<MockGateway>) -> Orchestrator {
    orchestrator_over(mock, Arc::new(InMemoryStore::new()))
}

pub fn orchestrator_over(mock: &Arc<MockGateway>, store: Arc<dyn Store>) -> Orchestrator {
    Orchestrator::new(mock.clone(), store, fast_config()).expect("workflow graph compiles")
}

/// Records the id of every node that runs, in order, and the state each one returned.
#[derive(Default)]
pub struct NodeRecorder {
    visited: Mutex<Vec<String>>,
    returned: Mutex<Vec<(String, WorkflowState)>>,
}

impl NodeRecorder {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    /// States returned by `node_id`, oldest first; each is what got checkpointed.
    pub fn returned_by(&self, node_id: &str) -> Vec<WorkflowState> {
        self.returned
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == node_id)
            .map(|(_, state)| state.clone())
            .collect()
    }
}

#[async_trait]
impl NodeMiddleware<WorkflowState> for NodeRecorder {
    async fn around_run(
        &self,
        node_id: &str,
        state: WorkflowState,
        inner: NodeCall<WorkflowState>,
    ) -> Result<(WorkflowState, Next), AgentError> {
        self.visited.lock().unwrap().push(node_id.to_string());
        let (state, next) = inner(state).await?;
        self.returned
            .lock()
            .unwrap()
            .push((node_id.to_string(), state.clone()));
        Ok((state, next))
    }
}

/// Orchestrator whose node order is observable through the returned recorder.
pub fn recording_orchestrator(mock: &Arc<MockGateway>) -> (Orchestrator, Arc<NodeRecorder>) {
    let recorder = Arc::new(NodeRecorder::default());
    let orch = Orchestrator::with_middleware(
        mock.clone(),
        Arc::new(InMemoryStore::new()),
        fast_config(),
        recorder.clone(),
    )
    .expect("workflow graph compiles");
    (orch, recorder)
}
