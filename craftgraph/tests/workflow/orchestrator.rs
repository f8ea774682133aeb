//! Orchestrator contract: one run per thread, resume validation, long-poll.

use std::sync::Arc;
use std::time::Duration;

use craftgraph::{MockGateway, OrchestratorError, PollOutcome, ReportStatus};

use crate::common::{orchestrator, BOTTLES_AND_TWINE};

fn slow_gateway() -> Arc<MockGateway> {
    Arc::new(MockGateway::new().with_latency(Duration::from_millis(50)))
}

/// **Scenario**: While a spawned run is in flight, start and resume on the same thread are ThreadBusy.
#[tokio::test(start_paused = true)]
async fn second_run_on_busy_thread_is_rejected() {
    let orch = orchestrator(&slow_gateway());

    let started = orch.spawn_start("busy", "a bottle").await.unwrap();
    assert_eq!(started.status, ReportStatus::Started);
    assert!(orch.status("busy").await.unwrap().running);

    assert!(matches!(
        orch.start("busy", "a jar").await,
        Err(OrchestratorError::ThreadBusy(id)) if id == "busy"
    ));
    assert!(matches!(
        orch.resume("busy", "glass").await,
        Err(OrchestratorError::ThreadBusy(_))
    ));
}

/// **Scenario**: Threads are independent; a busy thread does not block another.
#[tokio::test(start_paused = true)]
async fn other_threads_are_not_blocked() {
    let orch = orchestrator(&slow_gateway());
    orch.spawn_start("one", "a bottle").await.unwrap();
    let report = orch.start("two", "a jar").await.unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);
}

/// **Scenario**: A short long-poll times out without cancelling the run; a longer one
/// returns the settled report.
#[tokio::test(start_paused = true)]
async fn long_poll_times_out_then_returns_update() {
    let orch = orchestrator(&slow_gateway());
    orch.spawn_start("poll", "a bottle").await.unwrap();

    let first = orch
        .wait_for_update("poll", Duration::from_millis(10))
        .await
        .unwrap();
    assert_eq!(first, PollOutcome::Timeout);

    match orch.wait_for_update("poll", Duration::from_secs(30)).await.unwrap() {
        PollOutcome::Update(report) => {
            assert_eq!(report.status, ReportStatus::WaitingForInput);
            assert_eq!(report.questions.len(), 1);
        }
        PollOutcome::Timeout => panic!("run should have settled"),
    }
    assert!(!orch.status("poll").await.unwrap().running);
}

/// **Scenario**: A spawned resume settles through the same channel as a spawned start.
#[tokio::test(start_paused = true)]
async fn spawned_resume_publishes_report() {
    let orch = orchestrator(&slow_gateway());
    orch.start("resume", "a bottle").await.unwrap();

    let accepted = orch.spawn_resume("resume", "it's glass").await.unwrap();
    assert_eq!(accepted.status, ReportStatus::Started);

    let mut rx = orch.subscribe("resume");
    let report = rx
        .wait_for(|r| r.as_ref().is_some_and(|r| r.is_settled()))
        .await
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    let state = orch.state("resume").await.unwrap();
    assert_eq!(state.ingredients[0].material.as_deref(), Some("glass"));
}

/// **Scenario**: Unknown threads are reported as such by status, resume and long-poll.
#[tokio::test]
async fn unknown_thread_everywhere() {
    let orch = orchestrator(&Arc::new(MockGateway::new()));
    assert!(matches!(
        orch.status("ghost").await,
        Err(OrchestratorError::UnknownThread(_))
    ));
    assert!(matches!(
        orch.spawn_resume("ghost", "x").await,
        Err(OrchestratorError::UnknownThread(_))
    ));
    assert!(matches!(
        orch.wait_for_update("ghost", Duration::from_millis(1)).await,
        Err(OrchestratorError::UnknownThread(_))
    ));
}

/// **Scenario**: Resuming a completed thread is rejected and leaves its state untouched.
#[tokio::test]
async fn resume_without_pending_question_is_rejected() {
    let mock = Arc::new(
        MockGateway::new().push_response(craftgraph::TaskType::Extraction, BOTTLES_AND_TWINE),
    );
    let orch = orchestrator(&mock);
    orch.start("done", "bottles and twine").await.unwrap();
    let before = orch.state("done").await.unwrap();

    assert!(matches!(
        orch.resume("done", "glass").await,
        Err(OrchestratorError::NotWaitingForInput(_))
    ));
    assert_eq!(orch.state("done").await.unwrap(), before);
}

/// **Scenario**: Starting an existing thread id replaces it with a fresh workflow.
#[tokio::test]
async fn start_replaces_existing_thread() {
    let orch = orchestrator(&Arc::new(MockGateway::new()));
    orch.start("again", "a bottle").await.unwrap();
    orch.resume("again", "I don't know").await.unwrap();
    assert_eq!(orch.state("again").await.unwrap().clarification_rounds, 2);

    orch.start("again", "a jar").await.unwrap();
    let state = orch.state("again").await.unwrap();
    assert_eq!(state.user_input, "a jar");
    assert_eq!(state.clarification_rounds, 1);
}
