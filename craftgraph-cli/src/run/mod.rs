//! Run entry points: build the orchestrator from config, then start, resume or inspect threads.
//!
//! Each CLI invocation is one process, so threads live in the SQLite file at
//! `RunConfig::db_path` between invocations (feature `sqlite`); without it the
//! store is in-memory and only `start --interactive` is useful.

mod report;

use std::sync::Arc;

use craftgraph::{
    MockGateway, ModelGateway, Orchestrator, RunReport, StatusView, Store, WorkflowState,
};

use crate::config::{Error, RunConfig};
use crate::middleware::ProgressMiddleware;

pub use report::{render_report, render_status};

/// Gateway for `config`: the offline mock, or the OpenAI-compatible client.
pub fn build_gateway(config: &RunConfig) -> Result<Arc<dyn ModelGateway>, Error> {
    if config.offline {
        return Ok(Arc::new(MockGateway::new()));
    }
    openai_gateway(config)
}

#[cfg(feature = "openai")]
fn openai_gateway(config: &RunConfig) -> Result<Arc<dyn ModelGateway>, Error> {
    use async_openai::config::OpenAIConfig;

    let api_key = config
        .api_key
        .as_deref()
        .ok_or("OPENAI_API_KEY is not set; configure it in .env or pass --offline")?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(&config.api_base);
    Ok(Arc::new(craftgraph::OpenAiGateway::with_config(
        openai_config,
        config.model.clone(),
    )))
}

#[cfg(not(feature = "openai"))]
fn openai_gateway(_config: &RunConfig) -> Result<Arc<dyn ModelGateway>, Error> {
    Err("built without the `openai` feature; pass --offline".into())
}

/// Store for `config`: the SQLite file at `db_path` when the `sqlite` feature is on.
pub fn build_store(config: &RunConfig) -> Result<Arc<dyn Store>, Error> {
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(craftgraph::SqliteStore::new(&config.db_path)?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        let _ = config;
        Ok(Arc::new(craftgraph::InMemoryStore::new()))
    }
}

/// Orchestrator over the configured gateway and store; node progress on stderr when verbose.
pub fn build_orchestrator(config: &RunConfig) -> Result<Orchestrator, Error> {
    let gateway = build_gateway(config)?;
    let store = build_store(config)?;
    let orchestrator = if config.verbose {
        Orchestrator::with_middleware(
            gateway,
            store,
            config.workflow.clone(),
            Arc::new(ProgressMiddleware),
        )?
    } else {
        Orchestrator::new(gateway, store, config.workflow.clone())?
    };
    Ok(orchestrator)
}

/// New thread id from the current time.
pub fn new_thread_id() -> String {
    format!("craft-{}", chrono::Utc::now().timestamp_millis())
}

/// Starts `input` on `thread_id` and runs until it completes or asks a question.
pub async fn start(
    orchestrator: &Orchestrator,
    thread_id: &str,
    input: &str,
) -> Result<RunReport, Error> {
    Ok(orchestrator.start(thread_id, input).await?)
}

/// Answers the pending question of `thread_id`.
pub async fn resume(
    orchestrator: &Orchestrator,
    thread_id: &str,
    answer: &str,
) -> Result<RunReport, Error> {
    Ok(orchestrator.resume(thread_id, answer).await?)
}

pub async fn status(orchestrator: &Orchestrator, thread_id: &str) -> Result<StatusView, Error> {
    Ok(orchestrator.status(thread_id).await?)
}

/// Full saved state, for `show`.
pub async fn state(orchestrator: &Orchestrator, thread_id: &str) -> Result<WorkflowState, Error> {
    Ok(orchestrator.state(thread_id).await?)
}

/// Starts `input` and keeps answering with `answer_for(question)` until the run settles
/// without a question. Returns the last report.
pub async fn run_interactive<F>(
    orchestrator: &Orchestrator,
    thread_id: &str,
    input: &str,
    mut answer_for: F,
) -> Result<RunReport, Error>
where
    F: FnMut(&RunReport) -> Result<String, Error>,
{
    let mut report = start(orchestrator, thread_id, input).await?;
    while report.status == craftgraph::ReportStatus::WaitingForInput {
        let answer = answer_for(&report)?;
        report = resume(orchestrator, thread_id, &answer).await?;
    }
    Ok(report)
}
