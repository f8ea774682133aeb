//! craftgraph-cli library: config loading and run helpers behind the `craftgraph` binary.
//!
//! Reads model and persistence config from `.env`, builds an [`Orchestrator`](craftgraph::Orchestrator)
//! and starts, resumes or inspects workflow threads.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let config = craftgraph_cli::RunConfig::load(&craftgraph_cli::RunOptions { offline: true, ..Default::default() })?;
//! let orchestrator = craftgraph_cli::build_orchestrator(&config)?;
//! let report = craftgraph_cli::start(&orchestrator, "thread-1", "3 plastic bottles and twine").await?;
//! println!("{}", craftgraph_cli::render_report(&report));
//! ```

mod config;
mod logging;
mod middleware;
mod run;

pub use config::{Error, RunConfig, RunOptions};
pub use logging::init_tracing;
pub use middleware::ProgressMiddleware;
pub use run::{
    build_gateway, build_orchestrator, build_store, new_thread_id, render_report, render_status,
    resume, run_interactive, start, state, status,
};

#[cfg(test)]
mod tests;
