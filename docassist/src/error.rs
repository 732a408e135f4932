//! Graph and node execution error.
//!
//! Returned by `Node::run`, `CompiledStateGraph::invoke` and the LLM clients.

use thiserror::Error;

/// Error raised while running a node or the whole graph.
///
/// Tool failures are not mapped here: handlers turn them into tool text so the
/// model can see them. Only LLM, routing and checkpoint failures end a run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, unknown route).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display format of ExecutionFailed contains "execution failed" and the message.
    #[test]
    fn agent_error_display_execution_failed() {
        let err = AgentError::ExecutionFailed("llm down".to_string());
        let s = err.to_string();
        assert!(s.contains("execution failed"), "{}", s);
        assert!(s.contains("llm down"), "{}", s);
    }
}
