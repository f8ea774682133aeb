//! Key-value store with expiry: the durable home of checkpoints and fragments.
//!
//! Keys are namespaced strings `<resource>:<thread_id>[:<suffix>]`, built with
//! [`StoreKey`]. Values are JSON strings. An expired entry behaves exactly like a
//! missing one.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (I/O, SQLite, poisoned lock, ...).
    #[error("storage error: {0}")]
    Storage(String),
    /// Value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key-value store consumed by the checkpoint subsystem.
///
/// **Interaction**: Used as `Arc<dyn Store>` by `StoreCheckpointer` and by
/// fragment readers (`load_fragment`).
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the value, or `None` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Sets the value; `ttl = None` keeps it until deleted. Last writer wins.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Deletes the key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// True when the key is present and not expired.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Namespaced store key: `<resource>:<thread_id>[:<suffix>]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    resource: String,
    thread_id: String,
    suffix: Option<String>,
}

impl StoreKey {
    pub fn new(resource: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            thread_id: thread_id.into(),
            suffix: None,
        }
    }

    /// Appends a suffix; an empty suffix is ignored.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = if suffix.is_empty() { None } else { Some(suffix) };
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.thread_id)?;
        if let Some(suffix) = &self.suffix {
            write!(f, ":{}", suffix)?;
        }
        Ok(())
    }
}
