//! JSON-RPC 2.0 request loop for an MCP server.
//!
//! One JSON object per line in, one per line out. Requests get exactly one
//! response; notifications (no `id`) never do.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use docassist::tool_source::ToolSourceError;
use docassist::tools::{Tool, ToolRegistry};

/// Protocol version answered when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
}

/// The message of a tool error without the variant prefix.
fn error_text(e: &ToolSourceError) -> &str {
    match e {
        ToolSourceError::NotFound(m)
        | ToolSourceError::InvalidInput(m)
        | ToolSourceError::Transport(m)
        | ToolSourceError::JsonRpc(m) => m,
    }
}

fn text_result(text: &str, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}

/// An MCP server hosting a fixed set of tools.
pub struct McpServer {
    name: String,
    version: String,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serves until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(server = %self.name, tools = self.registry.len(), "MCP server running");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut out = response.to_string();
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        tracing::info!(server = %self.name, "stdin closed; shutting down");
        Ok(())
    }

    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    /// Handles one line; `None` when nothing is to be sent back.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let message: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                return Some(failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };
        let id = message.get("id").cloned();

        if message.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return id.map(|id| failure(id, INVALID_REQUEST, "Invalid JSON-RPC version"));
        }
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return id.map(|id| failure(id, INVALID_REQUEST, "Missing method"));
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        let Some(id) = id else {
            tracing::debug!(method, "notification");
            return None;
        };
        tracing::debug!(method, %id, "request");

        let response = match method {
            "initialize" => success(id, self.initialize(&params)),
            "ping" => success(id, json!({})),
            "tools/list" => success(id, self.list_tools()),
            "tools/call" => match self.call_tool(&params).await {
                Ok(result) => success(id, result),
                Err(message) => failure(id, INVALID_PARAMS, message),
            },
            other => failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };
        Some(response)
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list()
            .into_iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "inputSchema": spec.input_schema
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// `Err` is a protocol error (bad params, unknown tool); tool failures
    /// come back as an `isError` result.
    async fn call_tool(&self, params: &Value) -> Result<Value, String> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "tools/call requires a string 'name'".to_string())?;
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(args @ Value::Object(_)) => args.clone(),
            Some(_) => return Err("'arguments' must be an object".to_string()),
        };
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {}", name))?;

        match tool.call(arguments, None).await {
            Ok(content) => Ok(text_result(&content.text, false)),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                Ok(text_result(error_text(&e), true))
            }
        }
    }
}
