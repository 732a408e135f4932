//! `github-server`: MCP GitHub issue tools. Reads `GITHUB_TOKEN` and
//! `GITHUB_API_URL` from the environment.

use clap::Parser;
use tool_servers::github::{github_tools, GithubClient};
use tool_servers::{init_stderr_logging, McpServer};

#[derive(Parser, Debug)]
#[command(name = "github-server")]
#[command(about = "MCP server with get_last_issue and get_issue")]
struct Args {
    /// GitHub API root (overrides GITHUB_API_URL)
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_stderr_logging();
    let args = Args::parse();
    let client = match args.api_url {
        Some(url) => GithubClient::new(url, std::env::var("GITHUB_TOKEN").ok()),
        None => GithubClient::from_env(),
    };
    McpServer::new("github-server", github_tools(client))
        .serve_stdio()
        .await?;
    Ok(())
}
