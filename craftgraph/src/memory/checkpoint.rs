//! Checkpoint and metadata types.
//!
//! A checkpoint is the full graph state after one node plus the node the run
//! continues from. Written after every step so a reload always sees a fully
//! merged state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single checkpoint (source, step, created_at).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    pub step: u64,
    pub created_at: DateTime<Utc>,
}

/// What produced the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSource {
    /// Initial state before the first node.
    Input,
    /// After a node inside the run loop.
    Loop,
    /// The run suspended at an interrupt node.
    Interrupt,
    /// The run reached END.
    Update,
}

/// One checkpoint: state snapshot + resume point + metadata.
///
/// Stored by a `Checkpointer` keyed by thread id. `next_node` is `None` once the
/// graph has ended; for an interrupted run it is the interrupting node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<S> {
    pub id: String,
    pub state: S,
    pub next_node: Option<String>,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from the current state. Uses current time for id and created_at.
    pub fn from_state(
        state: S,
        next_node: Option<String>,
        source: CheckpointSource,
        step: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-{}", now.timestamp_millis(), step),
            state,
            next_node,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: now,
            },
        }
    }
}
