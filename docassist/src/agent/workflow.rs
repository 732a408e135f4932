//! The assistant graph:
//!
//! ```text
//! START -> classify_intent -+-> qa_agent ------------+-> update_memory -> END
//!                           +-> summarization_agent -+
//!                           +-> calculation_agent ---+
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, StateGraph, END, START,
};
use crate::llm::LlmClient;
use crate::memory::Checkpointer;
use crate::prompts::AssistantPrompts;
use crate::tool_source::ToolSource;

use super::classify::ClassifyIntentNode;
use super::handler::{HandlerKind, HandlerNode};
use super::state::{
    agent_state_updater, AgentState, STEP_CALCULATION, STEP_CLASSIFY, STEP_END, STEP_QA,
    STEP_SUMMARIZATION, STEP_UPDATE_MEMORY,
};
use super::update_memory::UpdateMemoryNode;

/// Maps `next_step` after classification to a node id; anything unexpected goes to QA.
pub fn route_after_classify(state: &AgentState) -> String {
    match state.next_step.as_str() {
        STEP_SUMMARIZATION | STEP_CALCULATION | STEP_QA => state.next_step.clone(),
        STEP_END => END.to_string(),
        _ => STEP_QA.to_string(),
    }
}

/// Builds and compiles the assistant workflow. With a checkpointer, `invoke`
/// with a thread id saves the final state of every turn.
pub fn build_workflow(
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    prompts: Arc<AssistantPrompts>,
    checkpointer: Option<Arc<dyn Checkpointer<AgentState>>>,
) -> Result<CompiledStateGraph<AgentState>, CompilationError> {
    let mut graph = StateGraph::<AgentState>::new()
        .with_state_updater(agent_state_updater())
        .with_middleware(Arc::new(LoggingNodeMiddleware::default()));

    graph.add_node(
        STEP_CLASSIFY,
        Arc::new(ClassifyIntentNode::new(llm.clone(), prompts.clone())),
    );
    for kind in [
        HandlerKind::Qa,
        HandlerKind::Summarization,
        HandlerKind::Calculation,
    ] {
        graph.add_node(
            kind.node_id(),
            Arc::new(HandlerNode::new(
                kind,
                llm.clone(),
                tools.clone(),
                prompts.clone(),
            )),
        );
        graph.add_edge(kind.node_id(), STEP_UPDATE_MEMORY);
    }
    graph.add_node(STEP_UPDATE_MEMORY, Arc::new(UpdateMemoryNode));

    graph.add_edge(START, STEP_CLASSIFY);
    let path_map: HashMap<String, String> = [
        (STEP_QA, STEP_QA),
        (STEP_SUMMARIZATION, STEP_SUMMARIZATION),
        (STEP_CALCULATION, STEP_CALCULATION),
        (END, END),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    graph.add_conditional_edges(STEP_CLASSIFY, Arc::new(route_after_classify), Some(path_map));
    graph.add_edge(STEP_UPDATE_MEMORY, END);

    match checkpointer {
        Some(cp) => graph.compile_with_checkpointer(cp),
        None => graph.compile(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_defaults_to_qa() {
        let mut s = AgentState::for_turn("x", "s", "u");
        s.next_step = STEP_CALCULATION.into();
        assert_eq!(route_after_classify(&s), STEP_CALCULATION);
        s.next_step = "weird".into();
        assert_eq!(route_after_classify(&s), STEP_QA);
        s.next_step = STEP_END.into();
        assert_eq!(route_after_classify(&s), END);
    }
}
