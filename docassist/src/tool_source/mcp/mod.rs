//! MCP tool source: a server subprocess spoken to over stdio.

mod session;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use env_config::McpServerConfig;

use crate::tool_source::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

pub use session::{McpSession, PROTOCOL_VERSION};

/// Tool source backed by one MCP server process.
///
/// Requests are serialized through a mutex; the stdio transport carries one
/// exchange at a time.
pub struct McpToolSource {
    session: Mutex<McpSession>,
}

impl McpToolSource {
    pub async fn spawn(
        command: &str,
        args: &[String],
        stderr_verbose: bool,
    ) -> Result<Self, ToolSourceError> {
        let session =
            McpSession::spawn(command, args, &Default::default(), stderr_verbose).await?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Spawns the server described by `config`. Only the "stdio" transport is supported.
    pub async fn from_config(
        config: &McpServerConfig,
        stderr_verbose: bool,
    ) -> Result<Self, ToolSourceError> {
        if config.transport != "stdio" {
            return Err(ToolSourceError::Transport(format!(
                "unsupported transport: {}",
                config.transport
            )));
        }
        let session =
            McpSession::spawn(&config.command, &config.args, &config.env, stderr_verbose).await?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

/// Maps a `tools/list` result to `ToolSpec`s.
fn parse_list_tools_result(result: Value) -> Result<Vec<ToolSpec>, ToolSourceError> {
    let tools_array = result
        .get("tools")
        .and_then(|t| t.as_array())
        .ok_or_else(|| ToolSourceError::Transport("no tools array in response".into()))?;
    let mut specs = Vec::with_capacity(tools_array.len());
    for t in tools_array {
        let obj = t
            .as_object()
            .ok_or_else(|| ToolSourceError::Transport("tool item not an object".into()))?;
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let description = obj
            .get("description")
            .and_then(|v| v.as_str())
            .map(String::from);
        let input_schema = obj
            .get("inputSchema")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));
        specs.push(ToolSpec {
            name,
            description,
            input_schema,
        });
    }
    Ok(specs)
}

/// Maps a `tools/call` result to text. `isError` results become errors
/// carrying the first text block.
fn parse_call_tool_result(result: Value) -> Result<ToolCallContent, ToolSourceError> {
    if result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        let msg = result
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|b| b.get("text").and_then(|t| t.as_str()))
            .unwrap_or("tool returned error")
            .to_string();
        return Err(ToolSourceError::Transport(msg));
    }
    let text_parts: Vec<&str> = result
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();
    let mut text = text_parts.join("\n").trim().to_string();
    if text.is_empty() {
        if let Some(structured) = result.get("structuredContent") {
            text = structured.to_string();
        }
    }
    if text.is_empty() {
        return Err(ToolSourceError::Transport(
            "no text or structuredContent in tools/call response".into(),
        ));
    }
    Ok(ToolCallContent { text })
}

#[async_trait]
impl ToolSource for McpToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        let mut session = self.session.lock().await;
        let result = session
            .request("tools/list", Value::Object(serde_json::Map::new()))
            .await?;
        parse_list_tools_result(result)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let mut session = self.session.lock().await;
        tracing::debug!(server = %session.server_name(), tool = name, "MCP tools/call");
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        let result = session.request("tools/call", params).await?;
        parse_call_tool_result(result)
    }
}
