//! # Upcycling workflow
//!
//! Turns a free-text list of household items into a product package: ingredients are
//! extracted and clarified with the user, categorized, turned into goals and product
//! options, safety-checked, rendered as concept images and assembled for export.
//!
//! ## Layout
//!
//! - [`WorkflowState`] / [`StateUpdate`]: the record every node reads, and the partial
//!   update it returns.
//! - [`NodeExecutor`] + [`ExecutorNode`]: node logic, wrapped into graph nodes that merge
//!   updates, retry faults and suspend for user input.
//! - [`workflow_graph`] / [`build_workflow_graph`]: wiring and routers (`routing`).
//! - [`workflow_checkpointer`]: snapshot persistence with TTLs and fragment mirrors.
//! - [`Orchestrator`]: start / resume / status / long-poll per `thread_id`.

pub mod clarification;
mod config;
mod executor;
mod graph;
pub mod ingredient;
pub mod keywords;
mod middleware;
pub mod nodes;
mod orchestrator;
pub mod outputs;
mod persistence;
pub mod routing;
mod state;
mod update;

pub use clarification::{ClarificationOutcome, ClarificationTier};
pub use config::{ConfigError, WorkflowConfig};
pub use executor::{ExecutorContext, ExecutorFault, ExecutorNode, NodeExecutor};
pub use graph::{build_workflow_graph, executors, workflow_graph};
pub use ingredient::{Category, Ingredient, IngredientField, IngredientSource};
pub use middleware::NodeTracking;
pub use orchestrator::{
    Orchestrator, OrchestratorError, PollOutcome, ReportStatus, RunReport, StatusView,
};
pub use outputs::{
    BillItem, ConceptVariant, ExportBundle, Goals, ProductOption, ProductPackage, ShareCard,
    SustainabilityReport, WorkflowAnalytics,
};
pub use persistence::{
    load_goals, load_ingredients, load_package, workflow_checkpointer, CHOICES_FRAGMENT,
    GOALS_FRAGMENT, INGREDIENTS_FRAGMENT, PACKAGE_FRAGMENT,
};
pub use state::{PendingQuestion, Phase, WorkflowErrorRecord, WorkflowState};
pub use update::StateUpdate;
