//! Compiled state graph: immutable, supports invoke, resume and stream.
//!
//! Built by `StateGraph::compile` and friends. Holds nodes, the transition table
//! (static edge or router + path map per node), optional checkpointer and node
//! middleware. When a checkpointer is set and config.thread_id is provided, a
//! checkpoint is saved after every node with the node the run continues from.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};
use crate::stream::{StreamEvent, StreamMode};

use super::logging;
use super::node_middleware::NodeMiddleware;
use super::state_graph::{Exit, END};
use super::{Next, Node, RunContext};

/// How a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// A node returned `Next::End` or routed to END.
    Completed,
    /// A node returned `Next::Interrupt`; resume with `invoke_from(node, ..)`.
    Interrupted { node: String },
}

/// Final state of a run plus how it stopped.
#[derive(Debug, Clone)]
pub struct RunOutcome<S> {
    pub state: S,
    pub status: RunStatus,
    /// Number of node executions in this invoke.
    pub steps: usize,
}

impl<S> RunOutcome<S> {
    pub fn is_interrupted(&self) -> bool {
        matches!(self.status, RunStatus::Interrupted { .. })
    }
}

/// Compiled graph: immutable structure, supports invoke only.
///
/// Runs from the entry node; after each node the returned `Next` and the node's
/// exit decide the successor. Exactly one node runs per step, and routers only
/// ever see the state the node returned.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) entry: String,
    pub(super) exits: HashMap<String, Exit<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Id of the entry node (target of the START edge).
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Registered node ids, sorted.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All possible successors of a node (END included), sorted. Empty for unknown ids.
    pub fn successors(&self, node_id: &str) -> Vec<String> {
        let mut out: Vec<String> = match self.exits.get(node_id) {
            Some(Exit::Static(to)) => vec![to.clone()],
            Some(Exit::Conditional { path_map, .. }) => {
                let set: HashSet<&String> = path_map.values().collect();
                set.into_iter().cloned().collect()
            }
            None => Vec::new(),
        };
        out.sort();
        out
    }

    /// Exit names a node's router may return, sorted. Empty for static exits.
    pub fn exit_names(&self, node_id: &str) -> Vec<String> {
        let mut out: Vec<String> = match self.exits.get(node_id) {
            Some(Exit::Conditional { path_map, .. }) => path_map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        out.sort();
        out
    }

    async fn run_node(
        &self,
        node_id: &str,
        state: S,
        run_ctx: Option<&RunContext<S>>,
    ) -> Result<(S, Next), AgentError> {
        let node = self
            .nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| AgentError::NodeNotFound(node_id.to_string()))?;

        if let Some(middleware) = &self.middleware {
            let run_ctx_owned = run_ctx.cloned();
            middleware
                .around_run(
                    node_id,
                    state,
                    Box::new(move |s| {
                        Box::pin(async move {
                            if let Some(ctx) = run_ctx_owned.as_ref() {
                                node.run_with_context(s, ctx).await
                            } else {
                                node.run(s).await
                            }
                        })
                    }),
                )
                .await
        } else if let Some(ctx) = run_ctx {
            node.run_with_context(state, ctx).await
        } else {
            node.run(state).await
        }
    }

    /// Resolves the successor of `node_id` from the returned state.
    /// `Ok(None)` means END.
    fn resolve(&self, node_id: &str, state: &S, next: &Next) -> Result<Option<String>, AgentError> {
        let target = match next {
            Next::End => return Ok(None),
            Next::Interrupt => return Ok(Some(node_id.to_string())),
            Next::Node(id) => id.clone(),
            Next::Continue => match self.exits.get(node_id) {
                Some(Exit::Static(to)) => to.clone(),
                Some(Exit::Conditional { router, path_map }) => {
                    let route = router(state);
                    path_map
                        .get(&route)
                        .cloned()
                        .ok_or_else(|| AgentError::UnknownRoute {
                            node: node_id.to_string(),
                            route,
                        })?
                }
                None => return Err(AgentError::NodeNotFound(node_id.to_string())),
            },
        };
        if target == END {
            return Ok(None);
        }
        if !self.nodes.contains_key(&target) {
            return Err(AgentError::NodeNotFound(target));
        }
        Ok(Some(target))
    }

    async fn save(
        &self,
        config: &Option<RunnableConfig>,
        state: &S,
        next_node: Option<String>,
        source: CheckpointSource,
        step: u64,
    ) -> Result<(), AgentError> {
        if let (Some(cp), Some(cfg)) = (&self.checkpointer, config) {
            if cfg.thread_id.is_some() {
                let checkpoint = Checkpoint::from_state(state.clone(), next_node, source, step);
                cp.put(cfg, &checkpoint).await?;
            }
        }
        Ok(())
    }

    /// Shared run loop used by invoke(), invoke_from() and stream().
    async fn run_loop_inner(
        &self,
        mut state: S,
        config: &Option<RunnableConfig>,
        start_id: String,
        run_ctx: Option<&RunContext<S>>,
    ) -> Result<RunOutcome<S>, AgentError> {
        logging::log_graph_start(&start_id);
        let mut current_id = start_id;
        let mut steps = 0usize;

        loop {
            if steps >= self.recursion_limit {
                let err = AgentError::RecursionLimit(self.recursion_limit);
                logging::log_graph_error(&err);
                return Err(err);
            }
            steps += 1;

            logging::log_node_start(&current_id);
            let (new_state, next) = match self.run_node(&current_id, state.clone(), run_ctx).await {
                Ok(out) => out,
                Err(err) => {
                    logging::log_graph_error(&err);
                    return Err(err);
                }
            };
            logging::log_node_complete(&current_id, &next);
            state = new_state;

            if let Some(ctx) = run_ctx {
                ctx.emit_step(&current_id, &state).await;
            }

            let successor = match self.resolve(&current_id, &state, &next) {
                Ok(s) => s,
                Err(err) => {
                    logging::log_graph_error(&err);
                    return Err(err);
                }
            };

            if next == Next::Interrupt {
                self.save(
                    config,
                    &state,
                    Some(current_id.clone()),
                    CheckpointSource::Interrupt,
                    steps as u64,
                )
                .await?;
                logging::log_graph_interrupted(&current_id);
                if let Some(ctx) = run_ctx {
                    ctx.emit_interrupt(&current_id, &state).await;
                }
                return Ok(RunOutcome {
                    state,
                    status: RunStatus::Interrupted { node: current_id },
                    steps,
                });
            }

            match successor {
                None => {
                    self.save(config, &state, None, CheckpointSource::Update, steps as u64)
                        .await?;
                    logging::log_graph_complete();
                    return Ok(RunOutcome {
                        state,
                        status: RunStatus::Completed,
                        steps,
                    });
                }
                Some(next_id) => {
                    self.save(
                        config,
                        &state,
                        Some(next_id.clone()),
                        CheckpointSource::Loop,
                        steps as u64,
                    )
                    .await?;
                    current_id = next_id;
                }
            }
        }
    }

    /// Runs the graph from the entry node.
    ///
    /// When `config` has `thread_id` and the graph was compiled with a checkpointer,
    /// a checkpoint is saved after every node. Pass `None` for config to skip persistence.
    pub async fn invoke(
        &self,
        state: S,
        config: Option<RunnableConfig>,
    ) -> Result<RunOutcome<S>, AgentError> {
        self.run_loop_inner(state, &config, self.entry.clone(), None)
            .await
    }

    /// Runs the graph starting at `node_id` (e.g. the node recorded by an interrupt checkpoint).
    pub async fn invoke_from(
        &self,
        node_id: &str,
        state: S,
        config: Option<RunnableConfig>,
    ) -> Result<RunOutcome<S>, AgentError> {
        if !self.nodes.contains_key(node_id) {
            return Err(AgentError::NodeNotFound(node_id.to_string()));
        }
        self.run_loop_inner(state, &config, node_id.to_string(), None)
            .await
    }

    /// Streams a run from the entry node; see [`CompiledStateGraph::stream_from`].
    pub fn stream(
        &self,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let entry = self.entry.clone();
        self.spawn_stream(entry, state, config, stream_mode.into())
    }

    /// Streams a run starting at `node_id`, e.g. a resume after an interrupt.
    ///
    /// The run executes on its own task, checkpointing like `invoke_from`; the stream
    /// closes when the run completes, interrupts or fails. An unknown `node_id`
    /// yields an empty stream.
    pub fn stream_from(
        &self,
        node_id: &str,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        self.spawn_stream(node_id.to_string(), state, config, stream_mode.into())
    }

    fn spawn_stream(
        &self,
        start_id: String,
        state: S,
        config: Option<RunnableConfig>,
        modes: HashSet<StreamMode>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        tokio::spawn(async move {
            if !graph.nodes.contains_key(&start_id) {
                logging::log_graph_error(&AgentError::NodeNotFound(start_id));
                return;
            }
            let run_ctx = RunContext::new(config.clone().unwrap_or_default(), tx, modes);
            let _ = graph
                .run_loop_inner(state, &config, start_id, Some(&run_ctx))
                .await;
        });
        ReceiverStream::new(rx)
    }
}
