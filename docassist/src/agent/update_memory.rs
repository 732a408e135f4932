use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::schemas::UpdateMemoryResponse;

use super::state::{union_ids, AgentState, STEP_END, STEP_UPDATE_MEMORY};

/// Memory record for the turn: the current summary and the documents the response used.
pub fn memory_update(state: &AgentState) -> UpdateMemoryResponse {
    UpdateMemoryResponse {
        summary: state.conversation_summary.clone(),
        document_ids: state
            .current_response
            .as_ref()
            .map(|r| r.document_ids().to_vec())
            .unwrap_or_default(),
    }
}

/// Folds the response's documents into `active_documents` and ends the turn.
pub struct UpdateMemoryNode;

#[async_trait]
impl Node<AgentState> for UpdateMemoryNode {
    fn id(&self) -> &str {
        STEP_UPDATE_MEMORY
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        let memory = memory_update(&state);
        let mut update = state.without_messages();
        union_ids(&mut update.active_documents, &memory.document_ids);
        update.next_step = STEP_END.to_string();
        tracing::debug!(
            documents = ?memory.document_ids,
            active = update.active_documents.len(),
            "memory updated"
        );
        Ok((update, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{AgentResponse, AnswerResponse};

    /// **Scenario**: Response sources are unioned into active documents without duplicates.
    #[tokio::test]
    async fn unions_response_documents() {
        let mut state = AgentState::for_turn("q", "s", "u");
        state.active_documents = vec!["INV-001".into()];
        state.conversation_summary = "earlier talk".into();
        state.current_response = Some(AgentResponse::Answer(AnswerResponse {
            question: "q".into(),
            answer: "a".into(),
            sources: vec!["CON-001".into(), "INV-001".into()],
            confidence: 0.8,
            timestamp: chrono::Utc::now(),
        }));

        let memory = memory_update(&state);
        assert_eq!(memory.summary, "earlier talk");

        let (update, next) = UpdateMemoryNode.run(state).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(update.active_documents, vec!["INV-001", "CON-001"]);
        assert_eq!(update.next_step, STEP_END);
        assert!(update.messages.is_empty());
    }
}
