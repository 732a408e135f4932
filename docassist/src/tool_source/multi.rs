//! Several tool sources behind one `ToolSource`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSource, ToolSourceError, ToolSpec};

/// Merges the tools of several sources. A call is routed to the source that
/// listed the tool name; the first source wins on duplicate names.
pub struct MultiToolSource {
    sources: Vec<Box<dyn ToolSource>>,
    routes: RwLock<HashMap<String, usize>>,
}

impl MultiToolSource {
    pub fn new(sources: Vec<Box<dyn ToolSource>>) -> Self {
        Self {
            sources,
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    async fn route(&self, name: &str) -> Result<usize, ToolSourceError> {
        if let Some(idx) = self.routes.read().await.get(name) {
            return Ok(*idx);
        }
        self.list_tools().await?;
        self.routes
            .read()
            .await
            .get(name)
            .copied()
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl ToolSource for MultiToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        let mut all = Vec::new();
        let mut routes = HashMap::new();
        for (idx, source) in self.sources.iter().enumerate() {
            for spec in source.list_tools().await? {
                if routes.contains_key(&spec.name) {
                    tracing::warn!(tool = %spec.name, "duplicate tool name; keeping the first source");
                    continue;
                }
                routes.insert(spec.name.clone(), idx);
                all.push(spec);
            }
        }
        *self.routes.write().await = routes;
        Ok(all)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.call_tool_with_context(name, arguments, None).await
    }

    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let idx = self.route(name).await?;
        self.sources[idx]
            .call_tool_with_context(name, arguments, ctx)
            .await
    }
}
