//! State graph: nodes + explicit edges (from → to) + conditional routers.
//!
//! Add nodes with `add_node`, define static transitions with `add_edge(from, to)`
//! using `START` and `END` for entry/exit, and branching transitions with
//! `add_conditional_edges(from, router, path_map)`. The router is a pure predicate
//! over the state the node returned; its result is an exit name looked up in the
//! path map. Cycles are allowed; loop termination is the routers' job, backed by
//! the compiled graph's recursion limit.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)` or as a path map target.
pub const END: &str = "__end__";

/// Default maximum number of node executions per invoke.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Pure routing predicate: returns the exit name to take from the node's path map.
pub type Router<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Outgoing transition of a node after compilation.
#[derive(Clone)]
pub(crate) enum Exit<S> {
    /// Single static successor (may be END).
    Static(String),
    /// Router plus exit-name → node-id table (targets may be END).
    Conditional {
        router: Router<S>,
        path_map: HashMap<String, String>,
    },
}

/// State graph builder.
///
/// Generic over state type `S`. Build with `add_node` / `add_edge` /
/// `add_conditional_edges`, then `compile()` (or one of the `compile_with_*`
/// variants) to obtain an executable graph.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional: Vec<(String, Router<S>, HashMap<String, String>)>,
    recursion_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Caps the number of node executions per invoke.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Adds a node; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a static edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional exit to `from_id`.
    ///
    /// After the node runs, `router` is evaluated on the returned state; the exit
    /// name it yields is resolved through `path_map` (exit name → node id or END).
    /// An exit name missing from the map is a runtime `AgentError::UnknownRoute`.
    pub fn add_conditional_edges<F, I, K, V>(
        &mut self,
        from_id: impl Into<String>,
        router: F,
        path_map: I,
    ) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = path_map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let router: Router<S> = Arc::new(router);
        self.conditional.push((from_id.into(), router, map));
        self
    }

    /// Builds the executable graph without persistence or middleware.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None, None)
    }

    /// Builds the executable graph with a checkpointer; a checkpoint is saved after
    /// every node when the invoke config carries a thread id.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer), None)
    }

    /// Builds the executable graph with node middleware.
    pub fn compile_with_middleware(
        self,
        middleware: Arc<dyn NodeMiddleware<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None, Some(middleware))
    }

    /// Builds the executable graph with both checkpointer and node middleware.
    pub fn compile_with_checkpointer_and_middleware(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
        middleware: Arc<dyn NodeMiddleware<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer), Some(middleware))
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
        middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let known = |id: &str| self.nodes.contains_key(id);

        let mut entry: Option<String> = None;
        let mut exits: HashMap<String, Exit<S>> = HashMap::new();

        for (from, to) in &self.edges {
            if from != START && !known(from.as_str()) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !known(to.as_str()) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
            if from == START {
                if entry.is_some() {
                    return Err(CompilationError::MissingStart);
                }
                entry = Some(to.clone());
                continue;
            }
            if exits
                .insert(from.clone(), Exit::Static(to.clone()))
                .is_some()
            {
                return Err(CompilationError::ConflictingExits(from.clone()));
            }
        }

        for (from, router, path_map) in self.conditional {
            if !known(from.as_str()) {
                return Err(CompilationError::NodeNotFound(from));
            }
            if path_map.is_empty() {
                return Err(CompilationError::EmptyPathMap(from));
            }
            if let Some(target) = path_map
                .values()
                .find(|t| t.as_str() != END && !known(t.as_str()))
            {
                return Err(CompilationError::NodeNotFound(target.clone()));
            }
            if exits.contains_key(&from) {
                return Err(CompilationError::ConflictingExits(from));
            }
            exits.insert(from, Exit::Conditional { router, path_map });
        }

        let entry = entry.ok_or(CompilationError::MissingStart)?;

        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        if let Some(id) = ids.into_iter().find(|id| !exits.contains_key(*id)) {
            return Err(CompilationError::MissingExit(id.clone()));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            entry,
            exits,
            checkpointer,
            middleware,
            recursion_limit: self.recursion_limit,
        })
    }
}
