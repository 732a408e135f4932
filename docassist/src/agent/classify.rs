//! Intent classification node.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::structured::parse_structured;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::{format_template, AssistantPrompts};
use crate::schemas::{IntentType, UserIntent};

use super::state::{render_turns, AgentState, STEP_CALCULATION, STEP_QA, STEP_SUMMARIZATION};

/// Turns of history shown to the classifier.
const HISTORY_TURNS: usize = 3;

/// Handler node for an intent. `Unknown` goes to the QA handler.
pub fn step_for_intent(intent: IntentType) -> &'static str {
    match intent {
        IntentType::Summarization => STEP_SUMMARIZATION,
        IntentType::Calculation => STEP_CALCULATION,
        IntentType::Qa | IntentType::Unknown => STEP_QA,
    }
}

/// Keyword guess used when the model's reply names no intent.
///
/// Matches whole words by prefix, so "summarize" is not read as "sum".
pub fn keyword_intent(user_input: &str) -> IntentType {
    let lower = user_input.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |prefixes: &[&str]| words.iter().any(|w| prefixes.iter().any(|p| w.starts_with(p)));
    if words.iter().any(|w| *w == "sum" || *w == "sums") || has(&["calculat", "total"]) {
        IntentType::Calculation
    } else if has(&["summar", "overview"]) {
        IntentType::Summarization
    } else {
        IntentType::Qa
    }
}

/// Reads an intent from the classifier reply: JSON first, then a bare label.
fn intent_from_reply(reply: &str) -> Option<UserIntent> {
    if let Ok(intent) = parse_structured::<UserIntent>(reply) {
        return Some(intent);
    }
    let lower = reply.to_lowercase();
    [
        IntentType::Calculation,
        IntentType::Summarization,
        IntentType::Qa,
    ]
    .into_iter()
    .find(|i| lower.contains(i.as_str()))
    .map(|intent_type| UserIntent {
        intent_type,
        confidence: 0.6,
        reasoning: "intent label found in classifier reply".to_string(),
    })
}

/// Classifies the user input and routes to a handler.
pub struct ClassifyIntentNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<AssistantPrompts>,
}

impl ClassifyIntentNode {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<AssistantPrompts>) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl Node<AgentState> for ClassifyIntentNode {
    fn id(&self) -> &str {
        "classify_intent"
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        let history = render_turns(&state.conversation_history, HISTORY_TURNS);
        let history = if history.is_empty() {
            "(none)".to_string()
        } else {
            history
        };
        let prompt = format_template(
            &self.prompts.intent_classification,
            &[
                ("conversation_history", history.as_str()),
                ("user_input", state.user_input.as_str()),
            ],
        );
        let response = self.llm.invoke(&[Message::user(prompt)]).await?;

        let intent = intent_from_reply(&response.content).unwrap_or_else(|| {
            let intent_type = keyword_intent(&state.user_input);
            tracing::debug!(intent = %intent_type, "classifier reply unusable, keyword fallback");
            UserIntent {
                intent_type,
                confidence: 0.5,
                reasoning: "keyword fallback".to_string(),
            }
        });
        tracing::info!(
            intent = %intent.intent_type,
            confidence = intent.confidence,
            "intent classified"
        );

        let mut update = state.without_messages();
        update.next_step = step_for_intent(intent.intent_type).to_string();
        update.intent = Some(intent);
        update.messages.push(Message::user(state.user_input.clone()));
        Ok((update, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::prompts::default_from_embedded;

    fn node(reply: &str) -> (ClassifyIntentNode, Arc<MockLlm>) {
        let llm = Arc::new(MockLlm::with_text(reply));
        (
            ClassifyIntentNode::new(llm.clone(), Arc::new(default_from_embedded())),
            llm,
        )
    }

    /// **Scenario**: A JSON reply sets the intent and routes to its handler.
    #[tokio::test]
    async fn json_reply_routes() {
        let (node, llm) = node(
            r#"{"intent_type": "calculation", "confidence": 0.92, "reasoning": "asks for a sum"}"#,
        );
        let state = AgentState::for_turn("Add the invoice totals", "s", "u");
        let (update, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(update.next_step, STEP_CALCULATION);
        assert_eq!(update.intent.unwrap().confidence, 0.92);
        assert_eq!(update.messages, vec![Message::user("Add the invoice totals")]);

        let prompt = llm.calls()[0].messages[0].content().to_string();
        assert!(prompt.contains("User message: Add the invoice totals"));
        assert!(prompt.contains("(none)"));
    }

    /// **Scenario**: A bare label in prose is accepted.
    #[tokio::test]
    async fn label_in_prose() {
        let (node, _) = node("This is a summarization request.");
        let (update, _) = node
            .run(AgentState::for_turn("Tell me about the contracts", "s", "u"))
            .await
            .unwrap();
        assert_eq!(update.next_step, STEP_SUMMARIZATION);
    }

    /// **Scenario**: An unusable reply falls back to keywords in the input.
    #[tokio::test]
    async fn keyword_fallback() {
        let (node, _) = node("I cannot tell.");
        let (update, _) = node
            .run(AgentState::for_turn("Give me an overview of everything", "s", "u"))
            .await
            .unwrap();
        let intent = update.intent.unwrap();
        assert_eq!(intent.intent_type, IntentType::Summarization);
        assert_eq!(intent.reasoning, "keyword fallback");
    }

    /// **Scenario**: An "unknown" intent still goes to the QA handler.
    #[tokio::test]
    async fn unknown_routes_to_qa() {
        let (node, _) = node(r#"{"intent_type": "unknown", "confidence": 0.2, "reasoning": "?"}"#);
        let (update, _) = node
            .run(AgentState::for_turn("hello", "s", "u"))
            .await
            .unwrap();
        assert_eq!(update.intent.unwrap().intent_type, IntentType::Unknown);
        assert_eq!(update.next_step, STEP_QA);
    }

    #[test]
    fn keyword_intents() {
        assert_eq!(keyword_intent("What is the TOTAL of INV-001?"), IntentType::Calculation);
        assert_eq!(keyword_intent("summarize the contract"), IntentType::Summarization);
        assert_eq!(keyword_intent("who is the client?"), IntentType::Qa);
        assert_eq!(keyword_intent("sum of all claims"), IntentType::Calculation);
    }
}
