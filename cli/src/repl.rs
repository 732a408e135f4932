//! Interactive loop: read a line, run one assistant turn, print the outcome.
//!
//! Exits on EOF or `/quit`. A failed turn prints the error and the loop continues.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::Instrument;

use docassist::DocumentAssistant;

use crate::display;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Docs,
    Quit,
    Empty,
    Message(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => ReplCommand::Empty,
            "/help" => ReplCommand::Help,
            "/docs" => ReplCommand::Docs,
            "/quit" => ReplCommand::Quit,
            _ => ReplCommand::Message(trimmed.to_string()),
        }
    }
}

/// Runs the REPL until EOF or `/quit`. Turn errors are printed, not returned;
/// only I/O failures on `input` or `out` end the loop with an error.
pub async fn run_repl<R, W>(
    assistant: &mut DocumentAssistant,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut turn = 0usize;
    writeln!(out, "{}", display::help())?;

    loop {
        write!(out, "\nEnter Message: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out, "\nGoodbye!")?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => {
                writeln!(out, "\nGoodbye!")?;
                break;
            }
            ReplCommand::Help => writeln!(out, "{}", display::help())?,
            ReplCommand::Docs => {
                let docs = assistant.documents().await;
                writeln!(out, "{}", display::documents(&docs))?;
            }
            ReplCommand::Message(message) => {
                writeln!(out, "\nProcessing...")?;
                out.flush()?;
                turn += 1;
                let span = tracing::info_span!("turn", n = turn);
                match assistant.process_message(&message).instrument(span).await {
                    Ok(outcome) => writeln!(out, "{}", display::outcome(&outcome))?,
                    Err(e) => {
                        tracing::warn!(error = %e, "turn failed");
                        writeln!(out, "{}", display::error(e))?;
                    }
                }
            }
        }
    }
    Ok(())
}
