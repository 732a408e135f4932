use async_trait::async_trait;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// A single tool the LLM can call.
///
/// Tools are registered in a [`ToolRegistry`](super::ToolRegistry) and exposed
/// to agent nodes through [`AggregateToolSource`](super::AggregateToolSource).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use docassist::tools::Tool;
/// use docassist::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "echo".to_string(),
///             description: Some("Echo the arguments back".to_string()),
///             input_schema: serde_json::json!({"type": "object"}),
///         }
///     }
///
///     async fn call(
///         &self,
///         args: Value,
///         _ctx: Option<&ToolCallContext>,
///     ) -> Result<ToolCallContent, ToolSourceError> {
///         Ok(ToolCallContent::new(args.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry; the LLM calls the tool by this name.
    fn name(&self) -> &str;

    /// Description and JSON schema, shaped like an MCP `tools/list` item.
    fn spec(&self) -> ToolSpec;

    /// Runs the tool.
    ///
    /// Domain failures the LLM should see (unknown document, bad arithmetic)
    /// come back as `Ok` text. `Err` is for calls that cannot be attempted,
    /// such as a missing required argument ([`ToolSourceError::InvalidInput`]).
    async fn call(
        &self,
        args: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
