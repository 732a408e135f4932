//! MCP server map: server name to subprocess launch parameters.
//!
//! Same shape as the `mcpServers` object of common MCP client configs:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "github": { "command": "github-server", "args": [], "env": {"GITHUB_TOKEN": "..."} },
//!     "filesystem": { "command": "filesystem-server", "args": ["./out"], "transport": "stdio" }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::LoadError;

pub const GITHUB_SERVER: &str = "github";
pub const FILESYSTEM_SERVER: &str = "filesystem";

fn default_transport() -> String {
    "stdio".to_string()
}

/// How to launch one tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the child process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_transport")]
    pub transport: String,
}

impl McpServerConfig {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            transport: default_transport(),
        }
    }
}

/// Servers by name, in name order.
pub type McpServers = BTreeMap<String, McpServerConfig>;

#[derive(Deserialize)]
struct McpConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: McpServers,
}

/// Parses an MCP config document.
pub fn parse_servers(json: &str) -> Result<McpServers, LoadError> {
    let file: McpConfigFile = serde_json::from_str(json)?;
    Ok(file.mcp_servers)
}

pub fn load_servers(path: impl AsRef<Path>) -> Result<McpServers, LoadError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| LoadError::McpRead {
        path: path.display().to_string(),
        source,
    })?;
    parse_servers(&json)
}

/// The github and filesystem servers of this workspace; the filesystem server
/// is confined to `base_dir`.
pub fn default_servers(base_dir: &Path) -> McpServers {
    let mut servers = McpServers::new();
    servers.insert(
        GITHUB_SERVER.to_string(),
        McpServerConfig::stdio("github-server", Vec::new()),
    );
    servers.insert(
        FILESYSTEM_SERVER.to_string(),
        McpServerConfig::stdio(
            "filesystem-server",
            vec![base_dir.display().to_string()],
        ),
    );
    servers
}
