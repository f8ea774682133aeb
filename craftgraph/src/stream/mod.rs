//! Events of a streamed graph run.
//!
//! `CompiledStateGraph::stream` and `stream_from` push one event per enabled
//! mode after each node, plus a final `Interrupted` when the run suspends.

use std::fmt::Debug;

/// Which per-node events a streamed run emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// The whole state after each node.
    Values,
    /// The node id together with the state it produced.
    Updates,
}

#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    Values(S),
    Updates { node_id: String, state: S },
    /// The run suspended at `node_id`. Sent for every mode set, and last.
    Interrupted { node_id: String, state: S },
}

impl<S> StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// State carried by the event.
    pub fn state(&self) -> &S {
        match self {
            StreamEvent::Values(state)
            | StreamEvent::Updates { state, .. }
            | StreamEvent::Interrupted { state, .. } => state,
        }
    }

    /// Node that produced the event; `None` for `Values`.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Values(_) => None,
            StreamEvent::Updates { node_id, .. } | StreamEvent::Interrupted { node_id, .. } => {
                Some(node_id)
            }
        }
    }
}
