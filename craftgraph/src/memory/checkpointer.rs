//! Checkpointer trait and error.
//!
//! A checkpointer saves and loads the latest `Checkpoint<S>` per thread. The
//! compiled graph calls `put` after every node when a thread id is configured;
//! callers resuming a thread call `get_tuple`.

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::{Checkpoint, CheckpointMetadata, RunnableConfig};

/// Errors from checkpoint persistence.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// `config.thread_id` is required but was `None`.
    #[error("thread_id is required")]
    ThreadIdRequired,
    /// State could not be (de)serialized.
    #[error("serialization: {0}")]
    Serialization(String),
    /// Backing store failed.
    #[error("storage: {0}")]
    Storage(String),
}

impl From<crate::memory::StoreError> for CheckpointError {
    fn from(e: crate::memory::StoreError) -> Self {
        CheckpointError::Storage(e.to_string())
    }
}

/// Saves and loads checkpoints by thread id. Writes are last-writer-wins per thread.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Saves `checkpoint` as the latest for `config.thread_id`; returns the checkpoint id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Returns the latest checkpoint for the thread, or `None` when unknown or expired.
    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError>;

    /// Removes everything stored for the thread.
    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError>;
}

/// Returns the thread id from config or `ThreadIdRequired`.
pub(crate) fn require_thread_id(config: &RunnableConfig) -> Result<&str, CheckpointError> {
    config
        .thread_id
        .as_deref()
        .ok_or(CheckpointError::ThreadIdRequired)
}
