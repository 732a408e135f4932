//! Tool source abstraction: list tools and call a tool.
//!
//! Agent nodes depend on [`ToolSource`] rather than on concrete tools.
//! Implementations: [`AggregateToolSource`](crate::tools::AggregateToolSource)
//! over in-process tools, [`McpToolSource`] over an MCP server subprocess, and
//! [`MultiToolSource`] that merges several sources.

mod context;
mod mcp;
mod multi;

pub use context::ToolCallContext;
pub use mcp::{McpSession, McpToolSource, PROTOCOL_VERSION};
pub use multi::MultiToolSource;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification, aligned with an MCP `tools/list` item.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: Option<String>,
    /// JSON Schema for the arguments (MCP `inputSchema`).
    pub input_schema: Value,
}

/// Text result of one tool call (MCP `content[].text`).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Errors from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("MCP/transport error: {0}")]
    Transport(String),
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),
}

/// Lists tools and calls them by name with JSON arguments.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError>;

    /// Call with per-call context (session and user ids).
    /// The default ignores `ctx`.
    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let _ = ctx;
        self.call_tool(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each ToolSourceError variant names its kind.
    #[test]
    fn tool_source_error_display_all_variants() {
        let s = ToolSourceError::NotFound("x".into()).to_string();
        assert!(s.contains("not found"), "{}", s);
        let s = ToolSourceError::InvalidInput("bad".into()).to_string();
        assert!(s.contains("invalid"), "{}", s);
        let s = ToolSourceError::Transport("pipe closed".into()).to_string();
        assert!(s.contains("transport") && s.contains("pipe closed"), "{}", s);
        let s = ToolSourceError::JsonRpc("rpc".into()).to_string();
        assert!(s.contains("JSON-RPC"), "{}", s);
    }

    /// **Scenario**: ToolSpec serializes with the field names used on the wire.
    #[test]
    fn tool_spec_serde_shape() {
        let spec = ToolSpec {
            name: "calculator".into(),
            description: Some("Evaluate arithmetic".into()),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["name"], "calculator");
        assert_eq!(v["input_schema"]["type"], "object");
    }
}
