use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSource, ToolSourceError, ToolSpec};

use super::{Tool, ToolRegistry, ToolRegistryLocked};

/// [`ToolSource`] over in-process [`Tool`]s.
#[derive(Clone, Default)]
pub struct AggregateToolSource {
    registry: ToolRegistryLocked,
}

impl AggregateToolSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Self {
            registry: ToolRegistryLocked::new(registry),
        }
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) {
        self.registry.register(tool).await;
    }
}

#[async_trait]
impl ToolSource for AggregateToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.registry.list().await)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.registry.call(name, arguments, None).await
    }

    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.registry.call(name, arguments, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "upper".into(),
                description: None,
                input_schema: json!({"type": "object"}),
            }
        }

        async fn call(
            &self,
            args: Value,
            ctx: Option<&ToolCallContext>,
        ) -> Result<ToolCallContent, ToolSourceError> {
            let text = args["text"].as_str().unwrap_or_default().to_uppercase();
            let session = ctx.and_then(|c| c.session_id.clone()).unwrap_or_default();
            Ok(ToolCallContent::new(format!("{text}{session}")))
        }
    }

    /// **Scenario**: Registered tools are listed and callable; unknown names are NotFound.
    #[tokio::test]
    async fn lists_and_calls_registered_tools() {
        let source = AggregateToolSource::from_tools(vec![Arc::new(Upper)]);
        let specs = source.list_tools().await.unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "upper");

        let out = source.call_tool("upper", json!({"text": "abc"})).await.unwrap();
        assert_eq!(out.text, "ABC");

        let err = source.call_tool("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::NotFound(n) if n == "missing"));
    }

    /// **Scenario**: Context is forwarded to the tool.
    #[tokio::test]
    async fn forwards_call_context() {
        let source = AggregateToolSource::new();
        source.register(Arc::new(Upper)).await;
        let ctx = ToolCallContext::new("-s1", "u1");
        let out = source
            .call_tool_with_context("upper", json!({"text": "x"}), Some(&ctx))
            .await
            .unwrap();
        assert_eq!(out.text, "X-s1");
    }

    /// **Scenario**: Re-registering a name replaces the tool without duplicating the listing.
    #[test]
    fn register_same_name_keeps_one_entry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Upper));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list().len(), 1);
    }
}
