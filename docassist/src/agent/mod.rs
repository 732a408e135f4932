//! Intent-routed document assistant workflow.
//!
//! One turn: classify the intent, run the matching handler (which may call
//! tools), then update memory. See [`build_workflow`] for the graph.

mod classify;
mod handler;
mod state;
mod update_memory;
mod workflow;

pub use classify::{keyword_intent, step_for_intent, ClassifyIntentNode};
pub use handler::{extract_doc_ids, parse_calculator_result, HandlerKind, HandlerNode};
pub use state::{
    agent_state_updater, render_turns, union_ids, AgentState, STEP_CALCULATION, STEP_CLASSIFY,
    STEP_END, STEP_QA, STEP_SUMMARIZATION, STEP_UPDATE_MEMORY,
};
pub use update_memory::{memory_update, UpdateMemoryNode};
pub use workflow::{build_workflow, route_after_classify};
