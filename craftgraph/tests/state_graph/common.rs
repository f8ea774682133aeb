//! Shared node for the graph integration tests.

use async_trait::async_trait;
use craftgraph::{AgentError, Next, Node};

/// Adds one to the counter and defers to the graph's transition table.
pub struct Step {
    id: &'static str,
}

impl Step {
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Node<u32> for Step {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, state: u32) -> Result<(u32, Next), AgentError> {
        Ok((state + 1, Next::Continue))
    }
}
