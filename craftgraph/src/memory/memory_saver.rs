//! In-memory checkpointer for tests and single-process runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpointer::require_thread_id;
use crate::memory::{Checkpoint, CheckpointError, CheckpointMetadata, Checkpointer, RunnableConfig};

/// Keeps the latest checkpoint per thread in a map. No expiry, no serialization.
pub struct MemorySaver<S> {
    inner: RwLock<HashMap<String, Checkpoint<S>>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(config: &RunnableConfig) -> Result<String, CheckpointError> {
    let thread_id = require_thread_id(config)?;
    Ok(if config.checkpoint_ns.is_empty() {
        thread_id.to_string()
    } else {
        format!("{}:{}", thread_id, config.checkpoint_ns)
    })
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = key(config)?;
        self.inner.write().await.insert(key, checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = key(config)?;
        Ok(self
            .inner
            .read()
            .await
            .get(&key)
            .map(|cp| (cp.clone(), cp.metadata.clone())))
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let key = key(config)?;
        self.inner.write().await.remove(&key);
        Ok(())
    }
}
