//! Prompt templates for the assistant, loaded from YAML.
//!
//! Default text lives in `docassist/prompts/assistant.yaml` and is embedded at
//! compile time. Set `PROMPTS_DIR` (or pass a directory) to override it.

mod load;

pub use load::{default_from_embedded, load, load_or_default, LoadError, PROMPTS_FILE};

use serde::Deserialize;

use crate::schemas::IntentType;

/// System prompt per handler. Each carries a `{conversation_summary}` placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemPrompts {
    pub qa: String,
    pub summarization: String,
    pub calculation: String,
}

/// Tool usage block and final structured-output request of one handler.
/// Both carry a `{user_input}` placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerPrompts {
    pub tool_instructions: String,
    pub final_prompt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerPromptSet {
    pub qa: HandlerPrompts,
    pub summarization: HandlerPrompts,
    pub calculation: HandlerPrompts,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseFormats {
    pub qa: String,
    pub summary: String,
    pub calculation: String,
}

/// Everything in `assistant.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantPrompts {
    /// Placeholders: `{conversation_history}`, `{user_input}`.
    pub intent_classification: String,
    pub system: SystemPrompts,
    pub handlers: HandlerPromptSet,
    /// Placeholders: `{intent}`, `{user_input}`, `{available_tools}`.
    pub agent_decision: String,
    pub response_format: ResponseFormats,
    /// Placeholders: `{conversation_history}`, `{max_length}`.
    pub memory_summary: String,
    /// Placeholders: `{repository}`, `{number}`, `{title}`, `{body}`.
    pub issue_summary: String,
}

impl AssistantPrompts {
    /// System prompt for `intent`. `Unknown` gets the QA prompt.
    pub fn chat_prompt_for(&self, intent: IntentType) -> &str {
        match intent {
            IntentType::Summarization => &self.system.summarization,
            IntentType::Calculation => &self.system.calculation,
            IntentType::Qa | IntentType::Unknown => &self.system.qa,
        }
    }

    /// Handler prompts for `intent`. `Unknown` gets the QA handler.
    pub fn handler_for(&self, intent: IntentType) -> &HandlerPrompts {
        match intent {
            IntentType::Summarization => &self.handlers.summarization,
            IntentType::Calculation => &self.handlers.calculation,
            IntentType::Qa | IntentType::Unknown => &self.handlers.qa,
        }
    }
}

/// Replaces each `{key}` in `template` with its value. Unknown placeholders
/// and other braces are left untouched.
pub fn format_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}
