//! Unit tests for the run helpers over an offline orchestrator.
//!
//! Scenarios: offline build, interactive loop, rendering, persistence across orchestrators.

use craftgraph::ReportStatus;

use crate::config::{RunConfig, RunOptions};
use crate::run::{
    build_orchestrator, new_thread_id, render_report, render_status, resume, run_interactive,
    start, status,
};

fn offline_config(dir: &tempfile::TempDir) -> RunConfig {
    let mut config = RunConfig::from_lookup(|k| match k {
        "CRAFTGRAPH_OFFLINE" => Some("1".to_string()),
        _ => None,
    })
    .unwrap();
    config.apply_options(&RunOptions {
        db_path: Some(dir.path().join("cli.db").to_string_lossy().into_owned()),
        offline: true,
        ..Default::default()
    });
    config
}

/// **Scenario**: An offline start asks a question, and the rendered report shows it.
#[tokio::test]
async fn offline_start_renders_question() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(&offline_config(&dir)).unwrap();

    let report = start(&orchestrator, "cli-1", "a bottle").await.unwrap();

    assert_eq!(report.status, ReportStatus::WaitingForInput);
    let text = render_report(&report);
    assert!(text.starts_with("thread cli-1: waiting for input"));
    assert!(text.contains("? What material"));
}

/// **Scenario**: The interactive loop answers every question until the run completes.
#[tokio::test]
async fn interactive_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(&offline_config(&dir)).unwrap();
    let mut asked = Vec::new();

    let report = run_interactive(&orchestrator, "cli-2", "a bottle", |r| {
        asked.push(r.questions.last().cloned().unwrap_or_default());
        Ok(match asked.len() {
            1 => "glass".to_string(),
            2 => "1 liter".to_string(),
            _ => "I don't know".to_string(),
        })
    })
    .await
    .unwrap();

    assert_eq!(report.status, ReportStatus::PhaseComplete);
    assert!(asked[0].contains("material"));
    assert!(asked[1].contains("size"));
}

/// **Scenario**: A second orchestrator over the same DB file resumes the thread (a new CLI process).
#[cfg(feature = "sqlite")]
#[tokio::test]
async fn resume_from_a_new_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(&dir);
    {
        let first = build_orchestrator(&config).unwrap();
        start(&first, "cli-3", "a bottle").await.unwrap();
    }

    let second = build_orchestrator(&config).unwrap();
    let report = resume(&second, "cli-3", "it's glass").await.unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);

    let view = status(&second, "cli-3").await.unwrap();
    let text = render_status(&view);
    assert!(text.contains("phase discovery"));
    assert!(text.contains("? What size"));
}

/// **Scenario**: Generated thread ids carry the craft- prefix.
#[test]
fn generated_thread_id() {
    assert!(new_thread_id().starts_with("craft-"));
}
