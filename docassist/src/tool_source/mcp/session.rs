//! MCP session over stdio: spawns the server, performs the initialize
//! handshake, and exchanges line-delimited JSON-RPC 2.0 messages.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::tool_source::ToolSourceError;

/// Protocol version sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn transport(e: impl std::fmt::Display) -> ToolSourceError {
    ToolSourceError::Transport(e.to_string())
}

/// A running MCP server child process. Killed when dropped.
pub struct McpSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    server_name: String,
}

impl McpSession {
    /// Spawns `command args` with `env` added to the inherited environment and
    /// completes the handshake. Child stderr is inherited when `stderr_verbose`.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        stderr_verbose: bool,
    ) -> Result<Self, ToolSourceError> {
        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if stderr_verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolSourceError::Transport(format!("spawn {}: {}", command, e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| transport("child stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| transport("child stdout unavailable"))?;

        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            server_name: command.to_string(),
        };
        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&mut self) -> Result<(), ToolSourceError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "clientInfo": {
                "name": "docassist",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let result = self.request("initialize", params).await?;
        if let Some(info) = result.get("serverInfo") {
            if let Some(name) = info.get("name").and_then(|n| n.as_str()) {
                self.server_name = name.to_string();
            }
        }
        self.notify("notifications/initialized", json!({})).await?;
        tracing::debug!(server = %self.server_name, "MCP session initialized");
        Ok(())
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn write_line(&mut self, message: &Value) -> Result<(), ToolSourceError> {
        let mut line = serde_json::to_string(message).map_err(transport)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(transport)?;
        self.stdin.flush().await.map_err(transport)
    }

    /// Sends a notification (no id, no response expected).
    pub async fn notify(&mut self, method: &str, params: Value) -> Result<(), ToolSourceError> {
        self.write_line(&json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await
    }

    /// Sends a request and waits up to 30 s for the response with the same id.
    /// Lines that are not JSON or carry another id are skipped.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, ToolSourceError> {
        self.next_id += 1;
        let id = self.next_id;
        tracing::trace!(server = %self.server_name, id, method, "MCP request");
        self.write_line(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;

        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.read_response(id))
            .await
            .map_err(|_| {
                ToolSourceError::Transport(format!("timeout waiting for {} response", method))
            })??;

        if let Some(err) = response.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(ToolSourceError::JsonRpc(message.to_string()));
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| ToolSourceError::Transport(format!("no result in {} response", method)))
    }

    async fn read_response(&mut self, id: u64) -> Result<Value, ToolSourceError> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(transport)?
                .ok_or_else(|| transport("server closed stdout"))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let msg: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(_) => {
                    tracing::debug!(server = %self.server_name, line, "skipping non-JSON line");
                    continue;
                }
            };
            if msg.get("id").and_then(|v| v.as_u64()) == Some(id) {
                return Ok(msg);
            }
        }
    }
}
