//! StateGraph compile failure cases: unknown node, missing entry, conflicting or missing exits.

use std::sync::Arc;

use craftgraph::graph::{END, START};
use craftgraph::{CompilationError, StateGraph};

use crate::common::Step;

/// **Scenario**: A static edge to an unregistered node fails with NodeNotFound.
#[test]
fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("step", Arc::new(Step::new("step")));
    graph.add_edge(START, "step");
    graph.add_edge("step", "missing");

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: A path map target that was never added fails with NodeNotFound.
#[test]
fn compile_fails_when_path_map_refers_to_unknown_node() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("step", Arc::new(Step::new("step")));
    graph.add_edge(START, "step");
    graph.add_conditional_edges(
        "step",
        |_: &u32| "again".to_string(),
        [("again", "step"), ("away", "nowhere")],
    );

    match graph.compile() {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "nowhere"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: A graph without an edge from START has no entry.
#[test]
fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("step", Arc::new(Step::new("step")));
    graph.add_edge("step", END);

    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

/// **Scenario**: Two edges from START make the entry ambiguous.
#[test]
fn compile_fails_with_two_start_edges() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("a", Arc::new(Step::new("a")));
    graph.add_node("b", Arc::new(Step::new("b")));
    graph.add_edge(START, "a");
    graph.add_edge(START, "b");
    graph.add_edge("a", END);
    graph.add_edge("b", END);

    assert!(matches!(graph.compile(), Err(CompilationError::MissingStart)));
}

/// **Scenario**: A node with both a static edge and a router has conflicting exits.
#[test]
fn compile_fails_with_edge_and_router_on_same_node() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("step", Arc::new(Step::new("step")));
    graph.add_edge(START, "step");
    graph.add_edge("step", END);
    graph.add_conditional_edges("step", |_: &u32| "done".to_string(), [("done", END)]);

    match graph.compile() {
        Err(CompilationError::ConflictingExits(id)) => assert_eq!(id, "step"),
        other => panic!("expected ConflictingExits, got {:?}", other.err()),
    }
}

/// **Scenario**: A registered node that nothing leads out of fails with MissingExit.
#[test]
fn compile_fails_when_node_has_no_exit() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("a", Arc::new(Step::new("a")));
    graph.add_node("dangling", Arc::new(Step::new("dangling")));
    graph.add_edge(START, "a");
    graph.add_edge("a", END);

    match graph.compile() {
        Err(CompilationError::MissingExit(id)) => assert_eq!(id, "dangling"),
        other => panic!("expected MissingExit, got {:?}", other.err()),
    }
}

/// **Scenario**: A router with an empty path map is rejected.
#[test]
fn compile_fails_with_empty_path_map() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("step", Arc::new(Step::new("step")));
    graph.add_edge(START, "step");
    graph.add_conditional_edges("step", |_: &u32| "x".to_string(), Vec::<(&str, &str)>::new());

    match graph.compile() {
        Err(CompilationError::EmptyPathMap(id)) => assert_eq!(id, "step"),
        other => panic!("expected EmptyPathMap, got {:?}", other.err()),
    }
}

/// **Scenario**: A valid graph compiles and runs to END.
#[tokio::test]
async fn valid_graph_compiles_and_runs() {
    let mut graph = StateGraph::<u32>::new();
    graph.add_node("a", Arc::new(Step::new("a")));
    graph.add_node("b", Arc::new(Step::new("b")));
    graph.add_edge(START, "a");
    graph.add_edge("a", "b");
    graph.add_edge("b", END);

    let compiled = graph.compile().unwrap();
    let outcome = compiled.invoke(0, None).await.unwrap();
    assert_eq!(outcome.state, 2);
    assert!(!outcome.is_interrupted());
}
