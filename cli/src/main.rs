//! `docassist` binary: interactive document assistant REPL.
//!
//! Subcommands: `docs` (list the document collection) and `issue-summary`
//! (summarize the newest GitHub issue through the MCP servers).

mod log_format;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use docassist::{AssistantConfig, DocumentAssistant, LlmClient};
use tokio::io::BufReader;

use cli::issue::IssueOptions;
use cli::{display, issue, repl};

#[derive(Parser, Debug)]
#[command(name = "docassist")]
#[command(about = "DocDacity document assistant: ask about, summarize and calculate over documents")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// User id recorded in the session
    #[arg(long, value_name = "ID", default_value = "demo_user")]
    user_id: String,

    /// Resume this session (a new id is generated when not set)
    #[arg(long, value_name = "ID")]
    session_id: Option<String>,

    /// Run without a language model (placeholder replies, keyword intents)
    #[arg(long)]
    offline: bool,

    /// Verbose: debug logging for graph nodes and tool calls
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to a daily file under the state directory instead of stderr
    #[arg(long)]
    log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the documents in the collection and exit
    Docs,
    /// Summarize the newest issue of a GitHub repository into summary.txt
    IssueSummary(IssueArgs),
}

#[derive(clap::Args, Debug)]
struct IssueArgs {
    #[arg(long)]
    owner: String,

    #[arg(long)]
    repo: String,

    /// MCP servers JSON (`{"mcpServers": {...}}`); default launches github-server and filesystem-server
    #[arg(long, value_name = "PATH")]
    mcp_config: Option<PathBuf>,

    /// Directory the filesystem server may write to
    #[arg(long, value_name = "DIR", default_value = ".")]
    base_dir: PathBuf,
}

fn llm_for(config: &AssistantConfig, offline: bool) -> Arc<dyn LlmClient> {
    if offline {
        cli::offline_llm()
    } else {
        Arc::new(config.openai_client())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init(args.verbose, args.log_file)?;

    if let Err(e) = config::load_and_apply("docassist", None) {
        tracing::warn!(error = %e, "config not loaded");
    }
    let config = AssistantConfig::from_env();

    let needs_llm = !matches!(args.cmd, Some(Command::Docs));
    if needs_llm && !args.offline && config.api_key.is_none() {
        eprintln!(
            "{}",
            display::error("OPENAI_API_KEY is not set. Add it to .env or pass --offline.")
        );
        return Ok(());
    }
    let llm = llm_for(&config, args.offline);

    match args.cmd {
        Some(Command::Docs) => {
            let assistant = DocumentAssistant::new(config, llm)?;
            println!("{}", display::documents(&assistant.documents().await));
        }
        Some(Command::IssueSummary(a)) => {
            let opts = IssueOptions {
                owner: a.owner,
                repo: a.repo,
                mcp_config: a.mcp_config,
                base_dir: a.base_dir,
                verbose: args.verbose,
            };
            let state = issue::run(llm, config.prompts_dir.as_deref(), &opts).await?;
            println!("{}", issue::report(&state));
        }
        None => {
            let mut assistant = DocumentAssistant::new(config, llm)?;
            let session_id = assistant.start_session(&args.user_id, args.session_id.as_deref())?;
            print!("{}", display::header());
            println!("Session started: {}", session_id);

            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run_repl(&mut assistant, stdin, &mut stdout).await?;
        }
    }
    Ok(())
}
