//! Invoke config: thread_id and checkpoint namespace.
//!
//! Used by `CompiledStateGraph::invoke` and `Checkpointer`. The thread id is the
//! primary key of every checkpoint; the namespace becomes the optional key suffix
//! (`workflow_state:<thread_id>:<ns>`).

/// Config for a single invoke. Identifies the thread whose checkpoint is written.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and
/// `Checkpointer::put` / `get_tuple`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Unique id of the workflow instance. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// Optional namespace for checkpoints. Default is empty (no key suffix).
    pub checkpoint_ns: String,
}

impl RunnableConfig {
    /// Config for the given thread with the default namespace.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            checkpoint_ns: String::new(),
        }
    }
}
