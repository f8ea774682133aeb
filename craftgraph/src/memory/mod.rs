//! # Memory: checkpointing over a key-value store
//!
//! ## Overview
//!
//! 1. **Store**: key-value storage with TTL (`get`, `set`, `delete`, `exists`) keyed by
//!    namespaced strings `<resource>:<thread_id>[:<suffix>]` ([`StoreKey`]).
//! 2. **Checkpointer**: latest state snapshot per thread, saved by the compiled graph
//!    after every node and read back on resume.
//!
//! ## Config
//!
//! [`RunnableConfig`] is passed to `CompiledStateGraph::invoke`. When using a checkpointer,
//! `thread_id` is required.
//!
//! ## Checkpointer Implementations
//!
//! | Type                  | Persistence        | Use case                      |
//! |-----------------------|--------------------|-------------------------------|
//! | [`MemorySaver`]       | In-memory map      | Engine tests                  |
//! | [`StoreCheckpointer`] | Any [`Store`]      | Workflows (TTL, fragments)    |
//!
//! ## Store Implementations
//!
//! | Type              | Persistence | Feature  |
//! |-------------------|-------------|----------|
//! | [`InMemoryStore`] | In-memory   | none     |
//! | [`SqliteStore`]   | SQLite file | `sqlite` |

mod checkpoint;
mod checkpointer;
mod config;
mod in_memory_store;
mod memory_saver;
mod serializer;
mod store;
mod store_checkpointer;

#[cfg(feature = "sqlite")]
mod sqlite_store;

pub use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use in_memory_store::InMemoryStore;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
pub use store::{Store, StoreError, StoreKey};
pub use store_checkpointer::{
    load_fragment, FragmentFn, StoreCheckpointer, TtlPolicy, DEFAULT_CHECKPOINT_TTL,
    STATE_RESOURCE,
};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
