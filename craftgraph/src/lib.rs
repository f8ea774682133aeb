//! # craftgraph
//!
//! A checkpointed, interruptible state-graph pipeline that turns a free-text
//! description of household materials into an upcycled product package.
//!
//! ## Design Principles
//!
//! - **Single state type**: every node reads the one [`WorkflowState`] and returns a
//!   partial [`StateUpdate`]; the executor wrapper merges it.
//! - **Explicit transitions**: the graph is a table of static edges and conditional
//!   exits with named path maps, validated at compile time.
//! - **Suspend and resume**: a node that needs an answer interrupts the run; the latest
//!   checkpoint records where to resume.
//! - **One model seam**: all model traffic goes through [`ModelGateway`], with retries,
//!   timeouts and typed fallbacks.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `Next`, middleware.
//! - [`memory`]: `Checkpointer`, `Store` and their in-memory / SQLite implementations.
//! - [`gateway`]: model gateway trait, retry policy, mock and OpenAI-compatible gateway.
//! - [`workflow`]: the upcycling nodes, routers, persistence and [`Orchestrator`].
//! - [`stream`]: events emitted by `CompiledStateGraph::stream`.
//!
//! ## Features
//!
//! - `sqlite` (default): SQLite-backed [`memory::Store`].
//! - `openai`: OpenAI-compatible gateway via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use craftgraph::{InMemoryStore, MockGateway, Orchestrator, WorkflowConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MockGateway::new()),
//!     Arc::new(InMemoryStore::new()),
//!     WorkflowConfig::default(),
//! )?;
//! let report = orchestrator.start("thread-1", "3 plastic bottles and some twine").await?;
//! for question in &report.questions {
//!     println!("{question}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod graph;
pub mod memory;
pub mod stream;
pub mod workflow;

pub use error::AgentError;
pub use gateway::{ModelGateway, MockGateway, ModelOutcome, RetryPolicy, TaskType};
#[cfg(feature = "openai")]
pub use gateway::OpenAiGateway;
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, NodeMiddleware, StateGraph};
pub use memory::{Checkpointer, InMemoryStore, RunnableConfig, Store, StoreCheckpointer};
#[cfg(feature = "sqlite")]
pub use memory::SqliteStore;
pub use workflow::{
    Orchestrator, OrchestratorError, Phase, PollOutcome, ReportStatus, RunReport, StateUpdate,
    StatusView, WorkflowConfig, WorkflowState,
};
