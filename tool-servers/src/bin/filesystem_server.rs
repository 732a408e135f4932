//! `filesystem-server [BASE_DIR]`: MCP file tools confined to BASE_DIR
//! (default: the current directory).

use std::path::PathBuf;

use clap::Parser;
use tool_servers::filesystem::{filesystem_tools, BaseDir};
use tool_servers::{init_stderr_logging, McpServer};

#[derive(Parser, Debug)]
#[command(name = "filesystem-server")]
#[command(about = "MCP server with write_file, append_to_file and read_file")]
struct Args {
    /// Directory all paths are resolved against
    base_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_stderr_logging();
    let args = Args::parse();
    let base = match args.base_dir {
        Some(dir) => BaseDir::new(dir)?,
        None => BaseDir::new(std::env::current_dir()?)?,
    };
    tracing::info!(base_dir = %base.root().display(), "filesystem server starting");
    McpServer::new("filesystem-server", filesystem_tools(base))
        .serve_stdio()
        .await?;
    Ok(())
}
