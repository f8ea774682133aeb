//! Orchestrator: starts, resumes and reports on workflow threads.
//!
//! Each `thread_id` is driven by at most one invocation at a time. Runs can be
//! awaited directly (`start`, `resume`) or spawned as a tokio task per thread
//! (`spawn_start`, `spawn_resume`); every settled run publishes a
//! [`RunReport`] on the thread's watch channel, which `wait_for_update`
//! long-polls without ever cancelling the task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::error::AgentError;
use crate::gateway::ModelGateway;
use crate::graph::{CompilationError, CompiledStateGraph, NodeMiddleware, RunOutcome, RunStatus};
use crate::memory::{
    Checkpoint, CheckpointError, CheckpointSource, Checkpointer, RunnableConfig, Store,
};

use super::config::WorkflowConfig;
use super::executor::ExecutorContext;
use super::graph::build_workflow_graph;
use super::middleware::NodeTracking;
use super::outputs::ProductOption;
use super::persistence::workflow_checkpointer;
use super::state::{Phase, WorkflowErrorRecord, WorkflowState};
use super::update::StateUpdate;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown or expired thread: {0}")]
    UnknownThread(String),

    #[error("thread {0} is not waiting for input")]
    NotWaitingForInput(String),

    #[error("thread {0} is already running")]
    ThreadBusy(String),

    #[error("graph compilation failed: {0}")]
    Compilation(#[from] CompilationError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Caller-facing status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Accepted and running in the background.
    Started,
    WaitingForInput,
    /// The run reached the end of the pipeline.
    PhaseComplete,
    Error,
}

/// Result of a start / resume, and what the watch channel carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub thread_id: String,
    pub status: ReportStatus,
    pub phase: Phase,
    pub node: String,
    pub questions: Vec<String>,
    pub message: Option<String>,
}

impl RunReport {
    fn started(thread_id: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            status: ReportStatus::Started,
            phase: Phase::Discovery,
            node: String::new(),
            questions: Vec::new(),
            message: None,
        }
    }

    fn from_state(state: &WorkflowState, status: ReportStatus) -> Self {
        let message = match status {
            ReportStatus::Error => state
                .errors
                .iter()
                .rev()
                .find(|e| !e.recoverable)
                .or_else(|| state.errors.last())
                .map(|e| e.message.clone()),
            _ => None,
        };
        Self {
            thread_id: state.thread_id.clone(),
            status,
            phase: state.phase,
            node: state.node.clone(),
            questions: state.user_questions.clone(),
            message,
        }
    }

    /// Anything but `Started`.
    pub fn is_settled(&self) -> bool {
        self.status != ReportStatus::Started
    }
}

/// Snapshot of a thread for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub thread_id: String,
    pub phase: Phase,
    pub node: String,
    pub needs_user_input: bool,
    pub user_questions: Vec<String>,
    pub errors: Vec<WorkflowErrorRecord>,
    pub selected_option: Option<ProductOption>,
    /// Whether a run for the thread is in flight right now.
    pub running: bool,
}

/// Outcome of [`Orchestrator::wait_for_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Update(RunReport),
    /// Nothing settled within the wait; the run keeps going.
    Timeout,
}

struct Inner {
    graph: CompiledStateGraph<WorkflowState>,
    checkpointer: Arc<dyn Checkpointer<WorkflowState>>,
    config: WorkflowConfig,
    active: DashSet<String>,
    channels: DashMap<String, watch::Sender<Option<RunReport>>>,
}

/// Marks a thread busy for as long as it lives.
struct BusyGuard {
    inner: Arc<Inner>,
    thread_id: String,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.active.remove(&self.thread_id);
    }
}

/// Drives workflow threads over one compiled graph.
///
/// **Interaction**: Owns the compiled graph, the checkpointer built over the
/// given [`Store`] and the injected [`ModelGateway`]; cloned cheaply into
/// spawned run tasks.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn Store>,
        config: WorkflowConfig,
    ) -> Result<Self, OrchestratorError> {
        Self::build(gateway, store, config, Arc::new(NodeTracking::new()))
    }

    /// Like [`Orchestrator::new`], with `extra` middleware running around every node.
    pub fn with_middleware(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn Store>,
        config: WorkflowConfig,
        extra: Arc<dyn NodeMiddleware<WorkflowState>>,
    ) -> Result<Self, OrchestratorError> {
        Self::build(gateway, store, config, Arc::new(NodeTracking::with_extra(extra)))
    }

    fn build(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn Store>,
        config: WorkflowConfig,
        middleware: Arc<dyn NodeMiddleware<WorkflowState>>,
    ) -> Result<Self, OrchestratorError> {
        let checkpointer: Arc<dyn Checkpointer<WorkflowState>> =
            Arc::new(workflow_checkpointer(store, &config));
        let ctx = Arc::new(ExecutorContext::new(gateway, config.clone()));
        let graph = build_workflow_graph(&ctx, checkpointer.clone(), middleware)?;
        Ok(Self {
            inner: Arc::new(Inner {
                graph,
                checkpointer,
                config,
                active: DashSet::new(),
                channels: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.inner.config
    }

    fn acquire(&self, thread_id: &str) -> Result<BusyGuard, OrchestratorError> {
        if !self.inner.active.insert(thread_id.to_string()) {
            return Err(OrchestratorError::ThreadBusy(thread_id.to_string()));
        }
        Ok(BusyGuard {
            inner: self.inner.clone(),
            thread_id: thread_id.to_string(),
        })
    }

    fn publish(&self, report: &RunReport) {
        self.inner
            .channels
            .entry(report.thread_id.clone())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(report.clone()));
    }

    async fn load(
        &self,
        thread_id: &str,
    ) -> Result<Option<Checkpoint<WorkflowState>>, OrchestratorError> {
        let config = RunnableConfig::for_thread(thread_id);
        Ok(self
            .inner
            .checkpointer
            .get_tuple(&config)
            .await?
            .map(|(cp, _)| cp))
    }

    /// Starts a new workflow for `thread_id` and runs it until it completes,
    /// fails or waits for input. An existing thread with the same id is replaced.
    pub async fn start(&self, thread_id: &str, input: &str) -> Result<RunReport, OrchestratorError> {
        let guard = self.acquire(thread_id)?;
        let state = self.initial_state(thread_id, input).await?;
        let entry = self.inner.graph.entry().to_string();
        Ok(self.run(guard, entry, state).await)
    }

    /// Answers the pending question of `thread_id` and continues the run.
    pub async fn resume(&self, thread_id: &str, answer: &str) -> Result<RunReport, OrchestratorError> {
        let guard = self.acquire(thread_id)?;
        let (node, state) = self.prepare_resume(thread_id, answer).await?;
        Ok(self.run(guard, node, state).await)
    }

    /// Validates and saves the initial state, then runs `start` in a background task.
    pub async fn spawn_start(
        &self,
        thread_id: &str,
        input: &str,
    ) -> Result<RunReport, OrchestratorError> {
        let guard = self.acquire(thread_id)?;
        let state = self.initial_state(thread_id, input).await?;
        let entry = self.inner.graph.entry().to_string();
        Ok(self.spawn(guard, entry, state))
    }

    /// Validates the resume, then continues the run in a background task.
    pub async fn spawn_resume(
        &self,
        thread_id: &str,
        answer: &str,
    ) -> Result<RunReport, OrchestratorError> {
        let guard = self.acquire(thread_id)?;
        let (node, state) = self.prepare_resume(thread_id, answer).await?;
        Ok(self.spawn(guard, node, state))
    }

    fn spawn(&self, guard: BusyGuard, node: String, state: WorkflowState) -> RunReport {
        let report = RunReport::started(&state.thread_id);
        self.publish(&report);
        let this = self.clone();
        tokio::spawn(async move {
            this.run(guard, node, state).await;
        });
        report
    }

    async fn initial_state(
        &self,
        thread_id: &str,
        input: &str,
    ) -> Result<WorkflowState, OrchestratorError> {
        let state = WorkflowState::new(thread_id, input);
        let checkpoint = Checkpoint::from_state(
            state.clone(),
            Some(self.inner.graph.entry().to_string()),
            CheckpointSource::Input,
            0,
        );
        self.inner
            .checkpointer
            .put(&RunnableConfig::for_thread(thread_id), &checkpoint)
            .await?;
        tracing::info!(thread_id, "workflow started");
        Ok(state)
    }

    async fn prepare_resume(
        &self,
        thread_id: &str,
        answer: &str,
    ) -> Result<(String, WorkflowState), OrchestratorError> {
        let checkpoint = self
            .load(thread_id)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownThread(thread_id.to_string()))?;
        let mut state = checkpoint.state;
        let node = match checkpoint.next_node {
            Some(node) if state.is_waiting_for_input() => node,
            _ => return Err(OrchestratorError::NotWaitingForInput(thread_id.to_string())),
        };
        state.pending_answer = Some(answer.to_string());
        tracing::info!(thread_id, node = %node, "workflow resumed");
        Ok((node, state))
    }

    /// Runs from `node` and turns whatever happens into a settled report.
    async fn run(&self, guard: BusyGuard, node: String, state: WorkflowState) -> RunReport {
        let thread_id = guard.thread_id.clone();
        let config = Some(RunnableConfig::for_thread(thread_id.clone()));
        let fallback = state.clone();
        let report = match self.inner.graph.invoke_from(&node, state, config).await {
            Ok(outcome) => report_outcome(&outcome),
            Err(err) => self.fail(&thread_id, fallback, err).await,
        };
        tracing::info!(
            thread_id = %thread_id,
            status = ?report.status,
            phase = %report.phase,
            node = %report.node,
            "workflow settled"
        );
        drop(guard);
        self.publish(&report);
        report
    }

    /// Moves the thread to `Phase::Error` after an engine failure, keeping the
    /// latest saved state.
    async fn fail(&self, thread_id: &str, fallback: WorkflowState, err: AgentError) -> RunReport {
        tracing::error!(thread_id, error = %err, "workflow run failed");
        let (mut state, step) = match self.load(thread_id).await {
            Ok(Some(cp)) => (cp.state, cp.metadata.step + 1),
            _ => (fallback, 0),
        };
        let node = if state.node.is_empty() {
            "orchestrator".to_string()
        } else {
            state.node.clone()
        };
        state.apply(
            StateUpdate {
                phase: Some(Phase::Error),
                ..StateUpdate::new()
            }
            .clear_interrupt()
            .with_error(WorkflowErrorRecord::fatal("engine_error", &node, err.to_string())),
        );
        let checkpoint = Checkpoint::from_state(state.clone(), None, CheckpointSource::Update, step);
        if let Err(save_err) = self
            .inner
            .checkpointer
            .put(&RunnableConfig::for_thread(thread_id), &checkpoint)
            .await
        {
            tracing::error!(thread_id, error = %save_err, "could not persist error state");
        }
        let mut report = RunReport::from_state(&state, ReportStatus::Error);
        report.message = Some(err.to_string());
        report
    }

    /// Current view of a thread.
    pub async fn status(&self, thread_id: &str) -> Result<StatusView, OrchestratorError> {
        let state = self
            .load(thread_id)
            .await?
            .ok_or_else(|| OrchestratorError::UnknownThread(thread_id.to_string()))?
            .state;
        Ok(StatusView {
            thread_id: state.thread_id.clone(),
            phase: state.phase,
            node: state.node.clone(),
            needs_user_input: state.needs_user_input,
            user_questions: state.user_questions.clone(),
            errors: state.errors.clone(),
            selected_option: state.selected_option.clone(),
            running: self.inner.active.contains(thread_id),
        })
    }

    /// Full saved state of a thread.
    pub async fn state(&self, thread_id: &str) -> Result<WorkflowState, OrchestratorError> {
        self.load(thread_id)
            .await?
            .map(|cp| cp.state)
            .ok_or_else(|| OrchestratorError::UnknownThread(thread_id.to_string()))
    }

    /// Receiver of the thread's reports. `None` until the first report.
    pub fn subscribe(&self, thread_id: &str) -> watch::Receiver<Option<RunReport>> {
        self.inner
            .channels
            .entry(thread_id.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Long-poll: waits up to `max_wait` (capped at the configured poll timeout)
    /// for the thread's run to settle.
    pub async fn wait_for_update(
        &self,
        thread_id: &str,
        max_wait: Duration,
    ) -> Result<PollOutcome, OrchestratorError> {
        if !self.inner.channels.contains_key(thread_id) {
            let state = self.state(thread_id).await?;
            if !self.inner.active.contains(thread_id) {
                return Ok(PollOutcome::Update(report_for_saved(&state)));
            }
        }
        let mut rx = self.subscribe(thread_id);
        let wait = max_wait.min(self.inner.config.poll_timeout);
        let settled = tokio::time::timeout(
            wait,
            rx.wait_for(|r| r.as_ref().is_some_and(RunReport::is_settled)),
        )
        .await;
        let outcome = match settled {
            Ok(Ok(report)) => report.clone().map_or(PollOutcome::Timeout, PollOutcome::Update),
            Ok(Err(_)) | Err(_) => PollOutcome::Timeout,
        };
        Ok(outcome)
    }
}

fn report_outcome(outcome: &RunOutcome<WorkflowState>) -> RunReport {
    let status = match (&outcome.status, outcome.state.phase) {
        (RunStatus::Interrupted { .. }, _) => ReportStatus::WaitingForInput,
        (RunStatus::Completed, Phase::Error) => ReportStatus::Error,
        (RunStatus::Completed, _) => ReportStatus::PhaseComplete,
    };
    RunReport::from_state(&outcome.state, status)
}

/// Report for a thread known only from its checkpoint.
fn report_for_saved(state: &WorkflowState) -> RunReport {
    let status = if state.phase == Phase::Error {
        ReportStatus::Error
    } else if state.is_waiting_for_input() {
        ReportStatus::WaitingForInput
    } else if state.phase == Phase::Complete {
        ReportStatus::PhaseComplete
    } else {
        ReportStatus::Started
    };
    RunReport::from_state(state, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, RetryPolicy};
    use crate::memory::InMemoryStore;

    fn orchestrator(mock: Arc<MockGateway>) -> Orchestrator {
        let config = WorkflowConfig {
            retry_policy: RetryPolicy::immediate(0),
            ..WorkflowConfig::default()
        };
        Orchestrator::new(mock, Arc::new(InMemoryStore::new()), config).unwrap()
    }

    /// **Scenario**: An offline run of "a bottle" stops with one material question.
    #[tokio::test]
    async fn start_waits_for_input() {
        let orch = orchestrator(Arc::new(MockGateway::new()));
        let report = orch.start("t1", "a bottle").await.unwrap();
        assert_eq!(report.status, ReportStatus::WaitingForInput);
        assert_eq!(report.node, "ask_user");
        assert_eq!(report.questions.len(), 1);
        let view = orch.status("t1").await.unwrap();
        assert!(view.needs_user_input);
        assert!(!view.running);
    }

    /// **Scenario**: Status and resume of an unknown thread are UnknownThread.
    #[tokio::test]
    async fn unknown_thread() {
        let orch = orchestrator(Arc::new(MockGateway::new()));
        assert!(matches!(
            orch.status("nope").await,
            Err(OrchestratorError::UnknownThread(_))
        ));
        assert!(matches!(
            orch.resume("nope", "glass").await,
            Err(OrchestratorError::UnknownThread(_))
        ));
    }

    /// **Scenario**: A second run on a thread that is already running is ThreadBusy.
    #[tokio::test]
    async fn busy_thread_is_rejected() {
        let orch = orchestrator(Arc::new(MockGateway::new()));
        let _guard = orch.acquire("t1").unwrap();
        assert!(matches!(
            orch.start("t1", "jar").await,
            Err(OrchestratorError::ThreadBusy(_))
        ));
    }
}
