//! LLM client abstraction used by the agent nodes.
//!
//! [`LlmClient`] returns assistant text plus optional tool calls.
//! [`ChatOpenAI`] talks to the Chat Completions API; [`MockLlm`] replays a
//! script for tests and offline runs. [`structured`] turns model text into
//! typed responses.

mod mock;
mod openai;
pub mod structured;

pub use mock::{MockCall, MockLlm};
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::tool_source::ToolSpec;

/// Tool choice mode for chat completions when tools are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    /// Model picks between a message and tool calls.
    #[default]
    Auto,
    None,
    Required,
}

impl std::str::FromStr for ToolChoiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "required" => Ok(Self::Required),
            _ => Err(format!(
                "unknown tool_choice: {} (use auto, none, or required)",
                s
            )),
        }
    }
}

/// One tool invocation requested by the model. `arguments` is the raw JSON text.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.to_string(),
            id: None,
        }
    }

    /// Arguments as a JSON object. Empty or invalid text yields `{}`.
    pub fn args(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str::<serde_json::Value>(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Token usage for one call, when the provider reports it.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Assistant text and the tool calls of one completion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Empty when the model answered directly.
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Plain text response with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text and optional tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// Like `invoke`, with tool definitions the model may call.
    ///
    /// The default ignores `tools`; clients without function calling stay usable.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        let _ = tools;
        self.invoke(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_mode_from_str() {
        assert_eq!("AUTO".parse::<ToolChoiceMode>(), Ok(ToolChoiceMode::Auto));
        assert_eq!("none".parse::<ToolChoiceMode>(), Ok(ToolChoiceMode::None));
        assert_eq!(
            "required".parse::<ToolChoiceMode>(),
            Ok(ToolChoiceMode::Required)
        );
        assert!("sometimes".parse::<ToolChoiceMode>().is_err());
    }

    /// **Scenario**: Tool call arguments parse to an object; garbage parses to an empty map.
    #[test]
    fn tool_call_args_tolerates_bad_json() {
        let call = ToolCall::new("calculator", serde_json::json!({"expression": "1+1"}));
        assert_eq!(call.args()["expression"], "1+1");
        let bad = ToolCall {
            name: "calculator".into(),
            arguments: "not json".into(),
            id: None,
        };
        assert!(bad.args().is_empty());
    }
}
