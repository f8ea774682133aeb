//! Per-run context handed to nodes when a graph is streamed.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode};

/// Config of the current run plus the event sink of `CompiledStateGraph::stream`.
///
/// A closed receiver is not an error: events are dropped and the run goes on.
#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub config: RunnableConfig,
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(
        config: RunnableConfig,
        stream_tx: mpsc::Sender<StreamEvent<S>>,
        stream_mode: HashSet<StreamMode>,
    ) -> Self {
        Self {
            config,
            stream_tx: Some(stream_tx),
            stream_mode,
        }
    }

    async fn send(&self, event: StreamEvent<S>) {
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Emits the events enabled for this run after `node_id` returned `state`.
    pub async fn emit_step(&self, node_id: &str, state: &S) {
        if self.stream_mode.contains(&StreamMode::Values) {
            self.send(StreamEvent::Values(state.clone())).await;
        }
        if self.stream_mode.contains(&StreamMode::Updates) {
            self.send(StreamEvent::Updates {
                node_id: node_id.to_string(),
                state: state.clone(),
            })
            .await;
        }
    }

    /// Emits `Interrupted` whatever the modes.
    pub async fn emit_interrupt(&self, node_id: &str, state: &S) {
        self.send(StreamEvent::Interrupted {
            node_id: node_id.to_string(),
            state: state.clone(),
        })
        .await;
    }
}
