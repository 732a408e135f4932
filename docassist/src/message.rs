//! Chat message types carried in `AgentState::messages`.
//!
//! Roles: System (usually first in a prompt), User, Assistant. Tool output is
//! fed back as a `User` message prefixed with the tool name.

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; typically placed first in the message list.
    System(String),
    /// User input, or tool output relayed to the model.
    User(String),
    /// Model reply.
    Assistant(String),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Wraps a tool result so the model can tell it apart from user text.
    pub fn tool_result(tool_name: &str, text: &str) -> Self {
        Self::User(format!("Tool {} returned: {}", tool_name, text))
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
        }
    }
}
