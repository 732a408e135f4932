//! `issue-summary` command: spawn the GitHub and filesystem MCP servers,
//! summarize the newest issue and write it to `summary.txt`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::McpServers;
use docassist::tool_source::ToolSourceError;
use docassist::{
    run_issue_summary, AgentError, IssueSummaryState, LlmClient,
    McpToolSource, MultiToolSource, ToolSource,
};

#[derive(Debug, thiserror::Error)]
pub enum IssueCommandError {
    #[error("MCP config: {0}")]
    Config(#[from] config::LoadError),
    #[error("no MCP servers configured")]
    NoServers,
    #[error("MCP server {name}: {source}")]
    Server {
        name: String,
        #[source]
        source: ToolSourceError,
    },
    #[error(transparent)]
    Run(#[from] AgentError),
}

/// Options of one `issue-summary` run.
#[derive(Debug, Clone)]
pub struct IssueOptions {
    pub owner: String,
    pub repo: String,
    /// JSON file in the `{"mcpServers": {...}}` shape. Defaults launch the
    /// bundled servers from `PATH`.
    pub mcp_config: Option<PathBuf>,
    /// Directory the filesystem server writes into when no config is given.
    pub base_dir: PathBuf,
    /// Forward server stderr to ours.
    pub verbose: bool,
}

pub fn servers_for(opts: &IssueOptions) -> Result<McpServers, IssueCommandError> {
    let servers = match &opts.mcp_config {
        Some(path) => config::load_servers(path)?,
        None => config::default_servers(&opts.base_dir),
    };
    if servers.is_empty() {
        return Err(IssueCommandError::NoServers);
    }
    Ok(servers)
}

async fn spawn_all(
    servers: &McpServers,
    verbose: bool,
) -> Result<MultiToolSource, IssueCommandError> {
    let mut sources: Vec<Box<dyn ToolSource>> = Vec::with_capacity(servers.len());
    for (name, server) in servers {
        tracing::info!(server = %name, command = %server.command, "starting MCP server");
        let source = McpToolSource::from_config(server, verbose)
            .await
            .map_err(|source| IssueCommandError::Server {
                name: name.clone(),
                source,
            })?;
        sources.push(Box::new(source));
    }
    Ok(MultiToolSource::new(sources))
}

pub async fn run(
    llm: Arc<dyn LlmClient>,
    prompts_dir: Option<&Path>,
    opts: &IssueOptions,
) -> Result<IssueSummaryState, IssueCommandError> {
    let servers = servers_for(opts)?;
    let tools = spawn_all(&servers, opts.verbose).await?;
    let prompts = Arc::new(docassist::prompts::load_or_default(prompts_dir));
    let state = run_issue_summary(llm, Arc::new(tools), prompts, &opts.owner, &opts.repo).await?;
    Ok(state)
}

/// Lines printed after a run.
pub fn report(state: &IssueSummaryState) -> String {
    let mut lines = Vec::new();
    match &state.issue {
        Some(issue) => lines.push(format!("Issue #{}: {}", issue.number, issue.title)),
        None => lines.push(format!("No issues in {}/{}", state.owner, state.repo)),
    }
    lines.push(format!("Summary: {}", state.summary));
    if let Some(path) = &state.summary_path {
        lines.push(format!("Saved to: {}", path));
    }
    if !state.write_result.is_empty() {
        lines.push(state.write_result.clone());
    }
    lines.join("\n")
}
