//! DocAssist command line library: output formatting, the chat REPL and the
//! issue summary command. The `docassist` binary wires them to clap.

pub mod display;
pub mod issue;
pub mod repl;

use std::sync::Arc;

use docassist::{LlmClient, MockLlm};

/// Reply of the offline model. The classifier cannot parse it, so intents
/// come from the keyword fallback.
pub const OFFLINE_REPLY: &str =
    "Offline mode: no language model is connected, so this is a placeholder answer.";

/// LLM used with `--offline`.
pub fn offline_llm() -> Arc<dyn LlmClient> {
    Arc::new(MockLlm::with_text(OFFLINE_REPLY))
}
