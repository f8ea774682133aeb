//! End-to-end workflow runs over a scripted gateway.

use std::sync::Arc;

use craftgraph::gateway::GatewayError;
use craftgraph::{MockGateway, Phase, ReportStatus, TaskType};

use crate::common::{orchestrator, recording_orchestrator, BOTTLES_AND_TWINE, BOTTLES_ONLY};

/// **Scenario**: Extracted bottles with size and material go straight from null_check to
/// categorize; only the synthesized fastener placeholder later asks a question.
#[tokio::test]
async fn complete_ingredients_skip_the_interrupt() {
    let mock = Arc::new(MockGateway::new().push_response(TaskType::Extraction, BOTTLES_ONLY));
    let (orch, recorder) = recording_orchestrator(&mock);

    let report = orch.start("scenario-a", "3 plastic water bottles").await.unwrap();

    assert_eq!(
        recorder.visited(),
        vec!["extract", "null_check", "categorize", "null_check", "ask_user"]
    );
    let state = orch.state("scenario-a").await.unwrap();
    assert_eq!(state.ingredients[0].material.as_deref(), Some("plastic"));
    assert_eq!(state.ingredients[1].name.as_deref(), Some("fastener"));
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    assert_eq!(mock.call_count(TaskType::QuestionGeneration), 1);
}

/// **Scenario**: With a container and a fastener fully described, the run completes without
/// asking anything and fills every output.
#[tokio::test]
async fn complete_run_fills_every_output() {
    let mock = Arc::new(MockGateway::new().push_response(TaskType::Extraction, BOTTLES_AND_TWINE));
    let (orch, recorder) = recording_orchestrator(&mock);

    let report = orch.start("full", "3 plastic water bottles and twine").await.unwrap();

    assert_eq!(report.status, ReportStatus::PhaseComplete);
    assert_eq!(report.phase, Phase::Complete);
    assert!(!recorder.visited().iter().any(|n| n == "ask_user"));
    assert_eq!(recorder.visited().last().map(String::as_str), Some("sharing"));

    let state = orch.state("full").await.unwrap();
    assert!(state.selected_option.as_ref().is_some_and(|o| o.is_safe()));
    assert_eq!(state.concept_variants.len(), 3);
    let package = state.final_package.as_ref().unwrap();
    assert_eq!(package.bill_of_materials.len(), 2);
    assert!(state.export.is_some());
    assert!(state.analytics.is_some());
    assert!(state.share.is_some());
    state.check_invariants().unwrap();
}

/// **Scenario**: "a bottle" asks exactly one material question; answering "it's aluminum"
/// fills the material and moves on to the next missing field.
#[tokio::test]
async fn name_only_ingredient_asks_for_material() {
    let mock = Arc::new(MockGateway::new());
    let (orch, recorder) = recording_orchestrator(&mock);

    let report = orch.start("scenario-b", "a bottle").await.unwrap();
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    assert_eq!(report.questions.len(), 1);
    assert!(report.questions[0].contains("material"));

    let report = orch.resume("scenario-b", "it's aluminum").await.unwrap();
    // ask_user ran three times: the first interrupt, the answer, the next interrupt.
    let runs = recorder.returned_by("ask_user");
    assert_eq!(runs.len(), 3);
    let after_answer = &runs[1];
    assert!(!after_answer.needs_user_input);
    assert!(after_answer.user_questions.is_empty());
    assert!(after_answer.pending_answer.is_none());
    assert_eq!(after_answer.ingredients[0].material.as_deref(), Some("aluminum"));

    // The size is still unknown, so null_check asks again.
    let state = orch.state("scenario-b").await.unwrap();
    assert_eq!(state.ingredients[0].material.as_deref(), Some("aluminum"));
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    assert!(report.questions.last().unwrap().contains("size"));
}

/// **Scenario**: Three unhelpful answers exhaust the clarification budget; the third resume
/// reaches categorize and no fourth question is generated.
#[tokio::test]
async fn clarification_rounds_are_bounded() {
    let mock = Arc::new(MockGateway::new());
    let orch = orchestrator(&mock);

    let mut report = orch.start("scenario-c", "a bottle").await.unwrap();
    for _ in 0..2 {
        assert_eq!(report.status, ReportStatus::WaitingForInput);
        report = orch.resume("scenario-c", "I don't know").await.unwrap();
    }
    assert_eq!(report.status, ReportStatus::WaitingForInput);
    let report = orch.resume("scenario-c", "I don't know").await.unwrap();

    assert_eq!(report.status, ReportStatus::PhaseComplete);
    assert_eq!(mock.call_count(TaskType::QuestionGeneration), 3);
    let state = orch.state("scenario-c").await.unwrap();
    assert_eq!(state.clarification_rounds, 3);
    assert!(state.has_error("clarification_budget_exhausted"));
    assert!(state.has_error("clarification_unresolved"));
    assert!(state.extraction_complete);
}

/// **Scenario**: Every generated idea mixes bleach and ammonia; all are vetoed, regeneration
/// runs out, and the workflow still completes with no selection and a recorded error.
#[tokio::test]
async fn unsafe_options_are_never_selected() {
    let hazardous = r#"{"options":[
        {"title":"Bottle cleaning spray","description":"Mix bleach and ammonia in the bottle","materials":["bleach","ammonia"]},
        {"title":"Drain unclogger","description":"Pour bleach then ammonia","materials":["bottle"]},
        {"title":"Grout whitener","description":"bleach with a splash of ammonia","materials":["twine"]}
    ]}"#;
    let mock = Arc::new(
        MockGateway::new()
            .push_response(TaskType::Extraction, BOTTLES_AND_TWINE)
            .with_response(TaskType::Creative, hazardous),
    );
    let orch = orchestrator(&mock);

    let report = orch.start("scenario-d", "bottles and twine").await.unwrap();

    assert_eq!(report.status, ReportStatus::PhaseComplete);
    let state = orch.state("scenario-d").await.unwrap();
    assert!(state.selected_option.is_none());
    assert!(state
        .candidate_options
        .iter()
        .all(|o| o.safety_check == Some(false)));
    assert!(state.has_error("all_options_blocked"));
    assert!(state.has_error("no_safe_option"));
    assert_eq!(state.choice_regeneration_count, 2);
    state.check_invariants().unwrap();
}

/// **Scenario**: A failing goal-formation call falls back to derived goals without losing
/// the extracted ingredients, and the failure is recorded as recoverable.
#[tokio::test]
async fn fallback_keeps_earlier_outputs() {
    let mock = Arc::new(
        MockGateway::new()
            .push_response(TaskType::Extraction, BOTTLES_AND_TWINE)
            .with_error(TaskType::GoalFormation, GatewayError::Transient("503".into())),
    );
    let orch = orchestrator(&mock);

    let report = orch.start("fallback", "bottles and twine").await.unwrap();

    assert_eq!(report.status, ReportStatus::PhaseComplete);
    let state = orch.state("fallback").await.unwrap();
    assert_eq!(state.ingredients.len(), 2);
    assert_eq!(state.ingredients[1].material.as_deref(), Some("jute"));
    assert!(state.goals.is_some());
    let fallback = state
        .errors
        .iter()
        .find(|e| e.kind == "model_fallback" && e.node == "goal_formation")
        .unwrap();
    assert!(fallback.recoverable);
    assert_eq!(mock.call_count(TaskType::GoalFormation), 2, "one retry");
}

/// **Scenario**: Out-of-range confidences from the model are clamped into [0, 1].
#[tokio::test]
async fn confidence_is_clamped() {
    let reply = r#"{"ingredients":[
        {"name":"jar","size":"1 l","material":"glass","category":"container","confidence":7.5},
        {"name":"wire","size":"2 m","material":"steel","category":"fastener","confidence":-2}
    ]}"#;
    let mock = Arc::new(MockGateway::new().push_response(TaskType::Extraction, reply));
    let orch = orchestrator(&mock);

    orch.start("clamp", "a jar and wire").await.unwrap();

    let state = orch.state("clamp").await.unwrap();
    let confidences: Vec<f32> = state.ingredients.iter().map(|i| i.confidence()).collect();
    assert_eq!(confidences, vec![1.0, 0.0]);
    state.check_invariants().unwrap();
}
