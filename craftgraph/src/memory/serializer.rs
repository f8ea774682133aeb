//! Serializer for checkpoint state (state <-> stored string).
//!
//! Used by `StoreCheckpointer`, whose backing `Store` holds string values.
//! `MemorySaver` keeps `Checkpoint<S>` in memory and does not use a Serializer.

use crate::memory::checkpointer::CheckpointError;

/// Serializes and deserializes values for checkpoint storage.
pub trait Serializer<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<String, CheckpointError>;
    fn deserialize(&self, raw: &str) -> Result<T, CheckpointError>;
}

/// JSON-based serializer. Requires T: Serialize + DeserializeOwned.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T> Serializer<T> for JsonSerializer
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<String, CheckpointError> {
        serde_json::to_string(value).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, raw: &str) -> Result<T, CheckpointError> {
        serde_json::from_str(raw).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}
