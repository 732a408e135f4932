//! MCP tool servers over stdio.
//!
//! [`McpServer`] speaks line-delimited JSON-RPC 2.0 and hosts any set of
//! [`docassist::tools::Tool`]s. Two tool sets ship with it:
//!
//! - [`filesystem`]: `write_file`, `append_to_file`, `read_file`, confined to a base directory.
//! - [`github`]: `get_last_issue`, `get_issue` over the GitHub REST API.
//!
//! Stdout carries the protocol, so logs go to stderr ([`init_stderr_logging`]).

pub mod filesystem;
pub mod github;
mod server;

pub use server::{McpServer, PROTOCOL_VERSION};

use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
