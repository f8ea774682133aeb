//! Checkpointer over a key-value [`Store`].
//!
//! The canonical record is `<resource>:<thread_id>[:<ns>]` (resource defaults to
//! `workflow_state`) holding the whole JSON-serialized `Checkpoint<S>`. After each
//! save, optional fragment mirrors (`ingredients:<id>`, `goals:<id>`, ...) are
//! written for independent readers; they are never read back by `get_tuple`.
//! A fragment the saved state does not have is deleted, so a mirror never
//! outlives the output it reflects.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::memory::checkpointer::require_thread_id;
use crate::memory::serializer::{JsonSerializer, Serializer};
use crate::memory::{
    Checkpoint, CheckpointError, CheckpointMetadata, Checkpointer, RunnableConfig, Store,
    StoreError, StoreKey,
};

/// Default resource name of the canonical checkpoint record.
pub const STATE_RESOURCE: &str = "workflow_state";

/// Default checkpoint TTL (1 hour).
pub const DEFAULT_CHECKPOINT_TTL: Duration = Duration::from_secs(60 * 60);

/// Chooses the TTL for a state when it is saved.
pub type TtlPolicy<S> = Arc<dyn Fn(&S) -> Duration + Send + Sync>;

/// Derives fragment mirrors `(resource, value)` from a state; `None` means the
/// output is not computed and its mirror is removed.
pub type FragmentFn<S> = Arc<dyn Fn(&S) -> Vec<(&'static str, Option<Value>)> + Send + Sync>;

/// Checkpointer persisting the latest checkpoint per thread into a `Store`.
///
/// **Interaction**: Passed to `StateGraph::compile_with_checkpointer`; the
/// orchestrator also calls `get_tuple` to resume a thread.
pub struct StoreCheckpointer<S> {
    store: Arc<dyn Store>,
    resource: String,
    ttl_policy: TtlPolicy<S>,
    fragments: Option<FragmentFn<S>>,
    _state: PhantomData<fn() -> S>,
}

impl<S> StoreCheckpointer<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Checkpointer with the default resource name and a fixed 1 hour TTL.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            resource: STATE_RESOURCE.to_string(),
            ttl_policy: Arc::new(|_| DEFAULT_CHECKPOINT_TTL),
            fragments: None,
            _state: PhantomData,
        }
    }

    /// Uses a different resource name for the canonical record.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// TTL chosen per saved state (e.g. longer for completed work).
    pub fn with_ttl_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&S) -> Duration + Send + Sync + 'static,
    {
        self.ttl_policy = Arc::new(policy);
        self
    }

    /// Writes fragment mirrors after each save and deletes the absent ones.
    pub fn with_fragments<F>(mut self, fragments: F) -> Self
    where
        F: Fn(&S) -> Vec<(&'static str, Option<Value>)> + Send + Sync + 'static,
    {
        self.fragments = Some(Arc::new(fragments));
        self
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn key(&self, config: &RunnableConfig) -> Result<StoreKey, CheckpointError> {
        let thread_id = require_thread_id(config)?;
        Ok(StoreKey::new(self.resource.clone(), thread_id).with_suffix(config.checkpoint_ns.clone()))
    }

    fn fragment_key(key: &StoreKey, resource: &str, config: &RunnableConfig) -> String {
        StoreKey::new(resource, key.thread_id())
            .with_suffix(config.checkpoint_ns.clone())
            .to_string()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for StoreCheckpointer<S>
where
    S: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = self.key(config)?;
        let ttl = (self.ttl_policy)(&checkpoint.state);
        let raw = JsonSerializer.serialize(checkpoint)?;
        self.store.set(&key.to_string(), &raw, Some(ttl)).await?;

        if let Some(fragments) = &self.fragments {
            for (resource, value) in fragments(&checkpoint.state) {
                let fragment_key = Self::fragment_key(&key, resource, config);
                match value {
                    Some(value) => {
                        let raw = serde_json::to_string(&value)
                            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
                        self.store.set(&fragment_key, &raw, Some(ttl)).await?;
                    }
                    None => self.store.delete(&fragment_key).await?,
                }
            }
        }
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = self.key(config)?;
        let raw = match self.store.get(&key.to_string()).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let checkpoint: Checkpoint<S> = JsonSerializer.deserialize(&raw)?;
        let metadata = checkpoint.metadata.clone();
        Ok(Some((checkpoint, metadata)))
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let key = self.key(config)?;
        if let Some(fragments) = &self.fragments {
            if let Some((cp, _)) = self.get_tuple(config).await? {
                for (resource, _) in fragments(&cp.state) {
                    self.store
                        .delete(&Self::fragment_key(&key, resource, config))
                        .await?;
                }
            }
        }
        self.store.delete(&key.to_string()).await?;
        Ok(())
    }
}

/// Reads a fragment mirror. A missing fragment means "not yet computed" and is `Ok(None)`.
pub async fn load_fragment<T>(
    store: &dyn Store,
    resource: &str,
    thread_id: &str,
) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    let key = StoreKey::new(resource, thread_id);
    match store.get(&key.to_string()).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string())),
        None => Ok(None),
    }
}
