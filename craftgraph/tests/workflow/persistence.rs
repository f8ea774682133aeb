//! Persistence: fragment mirrors and resuming after a restart.

use std::sync::Arc;
use std::time::Duration;

use craftgraph::workflow::{load_goals, load_ingredients, load_package};
use craftgraph::{InMemoryStore, MockGateway, PollOutcome, ReportStatus, Store, TaskType};

use crate::common::{orchestrator_over, BOTTLES_AND_TWINE};

/// **Scenario**: A completed run mirrors ingredients, goals and the package as fragments.
#[tokio::test]
async fn completed_run_writes_fragments() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let mock = Arc::new(MockGateway::new().push_response(TaskType::Extraction, BOTTLES_AND_TWINE));
    let orch = orchestrator_over(&mock, store.clone());

    orch.start("frag", "bottles and twine").await.unwrap();

    let ingredients = load_ingredients(store.as_ref(), "frag").await.unwrap().unwrap();
    assert_eq!(ingredients.len(), 2);
    assert!(load_goals(store.as_ref(), "frag").await.unwrap().is_some());
    let package = load_package(store.as_ref(), "frag").await.unwrap().unwrap();
    assert_eq!(package.sustainability.items_reused, 2);
}

/// **Scenario**: Restarting a finished thread id clears the previous run's goals and package mirrors.
#[tokio::test]
async fn restarted_thread_drops_previous_outputs() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let mock = Arc::new(MockGateway::new().push_response(TaskType::Extraction, BOTTLES_AND_TWINE));
    let orch = orchestrator_over(&mock, store.clone());

    let done = orch.start("reuse", "bottles and twine").await.unwrap();
    assert_eq!(done.status, ReportStatus::PhaseComplete);
    assert!(load_package(store.as_ref(), "reuse").await.unwrap().is_some());

    let report = orch.start("reuse", "a bottle").await.unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    let state = orch.state("reuse").await.unwrap();
    assert!(state.goals.is_none() && state.final_package.is_none());
    assert!(load_goals(store.as_ref(), "reuse").await.unwrap().is_none());
    assert!(load_package(store.as_ref(), "reuse").await.unwrap().is_none());
    let ingredients = load_ingredients(store.as_ref(), "reuse").await.unwrap().unwrap();
    assert_eq!(ingredients, state.ingredients);
}

/// **Scenario**: A fresh orchestrator over the same store reports and resumes a waiting thread.
#[tokio::test]
async fn new_orchestrator_resumes_saved_thread() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let first = orchestrator_over(&Arc::new(MockGateway::new()), store.clone());
    first.start("restart", "a bottle").await.unwrap();
    drop(first);

    let second = orchestrator_over(&Arc::new(MockGateway::new()), store);
    match second
        .wait_for_update("restart", Duration::from_millis(1))
        .await
        .unwrap()
    {
        PollOutcome::Update(report) => assert_eq!(report.status, ReportStatus::WaitingForInput),
        PollOutcome::Timeout => panic!("saved thread should report its status"),
    }
    let report = second.resume("restart", "it's tin").await.unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    let state = second.state("restart").await.unwrap();
    assert_eq!(state.ingredients[0].material.as_deref(), Some("tin"));
}

/// **Scenario**: A thread survives a restart when checkpoints live in a SQLite file.
#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_store_survives_restart() {
    use craftgraph::SqliteStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("craft.db");

    {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&path).unwrap());
        let orch = orchestrator_over(&Arc::new(MockGateway::new()), store);
        let report = orch.start("durable", "a bottle").await.unwrap();
        assert_eq!(report.status, ReportStatus::WaitingForInput);
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&path).unwrap());
    let orch = orchestrator_over(&Arc::new(MockGateway::new()), store);
    let view = orch.status("durable").await.unwrap();
    assert!(view.needs_user_input);
    assert_eq!(view.user_questions.len(), 1);

    orch.resume("durable", "glass").await.unwrap();
    let state = orch.state("durable").await.unwrap();
    assert_eq!(state.ingredients[0].material.as_deref(), Some("glass"));
}
