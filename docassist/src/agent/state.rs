//! Conversation state flowing through the assistant workflow.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::channels::{BoxedStateUpdater, FieldBasedUpdater};
use crate::message::Message;
use crate::schemas::{AgentResponse, ConversationTurn, UserIntent};

/// Routing labels written to [`AgentState::next_step`].
pub const STEP_CLASSIFY: &str = "classify_intent";
pub const STEP_QA: &str = "qa_agent";
pub const STEP_SUMMARIZATION: &str = "summarization_agent";
pub const STEP_CALCULATION: &str = "calculation_agent";
pub const STEP_UPDATE_MEMORY: &str = "update_memory";
pub const STEP_END: &str = "end";

/// State of one assistant turn.
///
/// `messages` is the running chat log and is append-only: a node's output
/// carries only the messages that node produced. Every other field is
/// replaced by the node's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default)]
    pub messages: Vec<Message>,
    pub user_input: String,
    #[serde(default)]
    pub intent: Option<UserIntent>,
    pub next_step: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub conversation_summary: String,
    #[serde(default)]
    pub active_documents: Vec<String>,
    #[serde(default)]
    pub current_response: Option<AgentResponse>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_id: String,
}

impl AgentState {
    /// Initial state for a turn: routed to the classifier, no response yet.
    pub fn for_turn(
        user_input: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            next_step: STEP_CLASSIFY.to_string(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Copy of this state with an empty message log, for node outputs.
    pub(crate) fn without_messages(&self) -> Self {
        Self {
            messages: Vec::new(),
            ..self.clone()
        }
    }
}

/// Appends `messages`, replaces everything else.
pub fn agent_state_updater() -> BoxedStateUpdater<AgentState> {
    Arc::new(FieldBasedUpdater::new(
        |current: &mut AgentState, update: &AgentState| {
            let mut messages = std::mem::take(&mut current.messages);
            messages.extend(update.messages.iter().cloned());
            *current = AgentState {
                messages,
                ..update.clone()
            };
        },
    ))
}

/// Renders the last `limit` turns as `User: ..` / `Assistant: ..` lines.
pub fn render_turns(turns: &[ConversationTurn], limit: usize) -> String {
    let start = turns.len().saturating_sub(limit);
    turns[start..]
        .iter()
        .map(|t| {
            format!(
                "User: {}\nAssistant: {}\n",
                t.user_input,
                t.agent_response.text()
            )
        })
        .collect()
}

/// Appends ids not already present, keeping first-seen order.
pub fn union_ids(target: &mut Vec<String>, ids: &[String]) {
    for id in ids {
        if !target.contains(id) {
            target.push(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::StateUpdater;
    use crate::schemas::AnswerResponse;

    fn turn(input: &str, answer: &str) -> ConversationTurn {
        ConversationTurn {
            user_input: input.into(),
            agent_response: AgentResponse::Answer(AnswerResponse {
                question: input.into(),
                answer: answer.into(),
                sources: vec![],
                confidence: 1.0,
                timestamp: chrono::Utc::now(),
            }),
            intent: None,
            tools_used: vec![],
            timestamp: chrono::Utc::now(),
        }
    }

    /// **Scenario**: Messages are appended; other fields take the update's value.
    #[test]
    fn updater_appends_messages_and_replaces_rest() {
        let updater = agent_state_updater();
        let mut current = AgentState::for_turn("hi", "s", "u");
        current.messages.push(Message::user("earlier"));
        current.tools_used = vec!["calculator".into()];

        let mut update = current.without_messages();
        update.messages.push(Message::assistant("reply"));
        update.next_step = STEP_END.into();
        update.tools_used = vec![];

        updater.apply_update(&mut current, &update);
        assert_eq!(
            current.messages,
            vec![Message::user("earlier"), Message::assistant("reply")]
        );
        assert_eq!(current.next_step, STEP_END);
        assert!(current.tools_used.is_empty());
    }

    #[test]
    fn render_turns_keeps_last_n() {
        let turns = vec![turn("a", "1"), turn("b", "2"), turn("c", "3")];
        assert_eq!(
            render_turns(&turns, 2),
            "User: b\nAssistant: 2\nUser: c\nAssistant: 3\n"
        );
        assert_eq!(render_turns(&[], 5), "");
    }

    #[test]
    fn union_ids_dedups_in_order() {
        let mut ids = vec!["INV-001".to_string()];
        union_ids(
            &mut ids,
            &["CON-001".into(), "INV-001".into(), "CON-001".into()],
        );
        assert_eq!(ids, vec!["INV-001", "CON-001"]);
    }
}
