//! Document tools over the shared [`SimulatedRetriever`]: search, reader and statistics.

mod reader;
mod search;
mod statistics;

pub use reader::{DocumentReaderTool, TOOL_DOCUMENT_READER};
pub use search::{DocumentSearchTool, TOOL_DOCUMENT_SEARCH};
pub use statistics::{DocumentStatisticsTool, TOOL_DOCUMENT_STATISTICS};

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::retrieval::{amount_from, SimulatedRetriever};

/// Retriever shared by the document tools and the assistant.
pub type SharedRetriever = Arc<RwLock<SimulatedRetriever>>;

/// Fields shown as "Amount:" in tool output. Narrower than the amount fields
/// used for searching.
const DISPLAY_AMOUNT_FIELDS: [&str; 3] = ["total", "amount", "value"];

pub(crate) fn display_amount(metadata: &Map<String, Value>) -> Option<f64> {
    amount_from(metadata, &DISPLAY_AMOUNT_FIELDS)
}

/// Optional number argument; numeric strings are accepted.
pub(crate) fn f64_arg(args: &Value, key: &str) -> Option<f64> {
    match args.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(['$', ','], "").parse().ok(),
        _ => None,
    }
}

pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
