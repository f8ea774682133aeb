//! Wires the node executors into the workflow graph.
//!
//! ```text
//! START → extract → null_check ─┬─ ask_user ─→ null_check
//!                               └─ categorize ─┬─ null_check (placeholders added)
//!                                              └─ goal_formation → choice_generation → evaluation
//! evaluation ─┬─ choice_generation (regenerate)
//!             └─ prompt_build → image_generate ─┬─ image_generate (next_variant)
//!                                               └─ packaging → export → analytics → sharing → END
//! ```

use std::sync::Arc;

use crate::graph::{CompilationError, CompiledStateGraph, NodeMiddleware, StateGraph, END, START};
use crate::memory::Checkpointer;

use super::executor::{ExecutorContext, ExecutorNode, NodeExecutor};
use super::nodes::{
    Analytics, AskUser, Categorize, ChoiceGeneration, Evaluation, Export, Extract, GoalFormation,
    ImageGenerate, NullCheck, Packaging, PromptBuild, Sharing, ANALYTICS, ASK_USER, CATEGORIZE,
    CHOICE_GENERATION, EVALUATION, EXPORT, EXTRACT, GOAL_FORMATION, IMAGE_GENERATE, NULL_CHECK,
    PACKAGING, PROMPT_BUILD, SHARING,
};
use super::routing::{
    route_after_categorize, route_after_evaluation, route_after_image, route_after_null_check,
    CATEGORIZE_PATHS, EVALUATION_PATHS, IMAGE_PATHS, NULL_CHECK_PATHS,
};
use super::state::WorkflowState;

/// All executors of one workflow, in pipeline order.
pub fn executors(ctx: &Arc<ExecutorContext>) -> Vec<Arc<dyn NodeExecutor>> {
    vec![
        Arc::new(Extract::new(ctx.clone())),
        Arc::new(NullCheck::new(ctx.clone())),
        Arc::new(AskUser::new(ctx.clone())),
        Arc::new(Categorize::new(ctx.clone())),
        Arc::new(GoalFormation::new(ctx.clone())),
        Arc::new(ChoiceGeneration::new(ctx.clone())),
        Arc::new(Evaluation::new(ctx.clone())),
        Arc::new(PromptBuild::new(ctx.clone())),
        Arc::new(ImageGenerate::new(ctx.clone())),
        Arc::new(Packaging),
        Arc::new(Export),
        Arc::new(Analytics),
        Arc::new(Sharing),
    ]
}

/// Uncompiled workflow graph: every node, static edge and conditional exit.
pub fn workflow_graph(ctx: &Arc<ExecutorContext>) -> StateGraph<WorkflowState> {
    let max_retries = ctx.config.max_node_retries;
    let ceiling = ctx.config.image_iteration_ceiling();

    let mut graph = StateGraph::<WorkflowState>::new().with_recursion_limit(ctx.config.recursion_limit);
    for executor in executors(ctx) {
        let id = executor.id();
        graph.add_node(id, Arc::new(ExecutorNode::new(executor, max_retries)));
    }
    graph
        .add_edge(START, EXTRACT)
        .add_edge(EXTRACT, NULL_CHECK)
        .add_conditional_edges(NULL_CHECK, route_after_null_check, NULL_CHECK_PATHS)
        .add_edge(ASK_USER, NULL_CHECK)
        .add_conditional_edges(CATEGORIZE, route_after_categorize, CATEGORIZE_PATHS)
        .add_edge(GOAL_FORMATION, CHOICE_GENERATION)
        .add_edge(CHOICE_GENERATION, EVALUATION)
        .add_conditional_edges(EVALUATION, route_after_evaluation, EVALUATION_PATHS)
        .add_edge(PROMPT_BUILD, IMAGE_GENERATE)
        .add_conditional_edges(
            IMAGE_GENERATE,
            move |s: &WorkflowState| route_after_image(s, ceiling),
            IMAGE_PATHS,
        )
        .add_edge(PACKAGING, EXPORT)
        .add_edge(EXPORT, ANALYTICS)
        .add_edge(ANALYTICS, SHARING)
        .add_edge(SHARING, END);
    graph
}

/// Compiles the workflow graph with its checkpointer and node middleware.
pub fn build_workflow_graph(
    ctx: &Arc<ExecutorContext>,
    checkpointer: Arc<dyn Checkpointer<WorkflowState>>,
    middleware: Arc<dyn NodeMiddleware<WorkflowState>>,
) -> Result<CompiledStateGraph<WorkflowState>, CompilationError> {
    workflow_graph(ctx).compile_with_checkpointer_and_middleware(checkpointer, middleware)
}
