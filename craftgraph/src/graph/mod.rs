//! State graph: nodes + explicit transition table, compile and invoke.
//!
//! Add nodes, static edges and conditional routers, compile (optionally with a
//! checkpointer and node middleware), then invoke with state. Runs can suspend
//! at a node (`Next::Interrupt`) and be resumed there with `invoke_from`.

mod compile_error;
mod compiled;
pub mod logging;
mod next;
mod node;
mod node_middleware;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, RunOutcome, RunStatus};
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeCall, NodeFuture, NodeMiddleware};
pub use run_context::RunContext;
pub use state_graph::{Router, StateGraph, DEFAULT_RECURSION_LIMIT, END, START};
