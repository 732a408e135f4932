//! Text shown by the REPL and the `docs` command.

use std::fmt::Display;

use crossterm::style::{StyledContent, Stylize};

use docassist::retrieval::{format_amount, Document};
use docassist::TurnOutcome;

pub const TITLE: &str = "DocDacity Intelligent Document Assistant";

fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn header() -> String {
    format!("\n{}\n{}\n{}\n", rule(60), TITLE.blue(), rule(60))
}

pub fn help() -> String {
    [
        format!("\n{}", "AVAILABLE COMMANDS:".blue()),
        "  /help     - Show this help message".to_string(),
        "  /docs     - List available documents".to_string(),
        "  /quit     - Exit the assistant".to_string(),
        "\nExample queries:".to_string(),
        "  - What's the total amount in invoice INV-001?".to_string(),
        "  - Summarize all contracts".to_string(),
        "  - Calculate the sum of all invoice totals".to_string(),
        "  - Find documents with amounts over $50,000".to_string(),
        String::new(),
    ]
    .join("\n")
}

/// Label for the first of total, amount or value present on the document.
fn amount_line(doc: &Document) -> Option<String> {
    ["total", "amount", "value"].iter().find_map(|key| {
        let value = doc.metadata.get(*key)?.as_f64()?;
        let mut label = key.to_string();
        label[..1].make_ascii_uppercase();
        Some(format!("{}: ${}", label, format_amount(value)))
    })
}

pub fn documents(docs: &[Document]) -> String {
    let separator = "-".repeat(40);
    let mut lines = vec![format!("\n{}", "AVAILABLE DOCUMENTS:".blue()), separator.clone()];
    for doc in docs {
        lines.push(format!("ID: {}", doc.doc_id));
        lines.push(format!("Title: {}", doc.title));
        lines.push(format!("Type: {}", doc.doc_type));
        if let Some(amount) = amount_line(doc) {
            lines.push(amount);
        }
        lines.push(separator.clone());
    }
    lines.join("\n")
}

fn section<T: Display>(styled: StyledContent<T>) -> String {
    format!("\n{}", styled)
}

/// Response text followed by the intent, sources, tools and summary lines
/// that have something to show.
pub fn outcome(outcome: &TurnOutcome) -> String {
    let mut out = String::from("\nAssistant: ");
    match &outcome.response {
        Some(response) => out.push_str(response.text()),
        None => out.push_str("(no response)"),
    }
    if let Some(intent) = &outcome.intent {
        out.push_str(&section(format!("INTENT: {}", intent.intent_type).green()));
    }
    if !outcome.active_documents.is_empty() {
        out.push_str(&section(
            format!("SOURCES: {}", outcome.active_documents.join(", ")).blue(),
        ));
    }
    if !outcome.tools_used.is_empty() {
        out.push_str(&section(
            format!("TOOLS USED: {}", outcome.tools_used.join(", ")).magenta(),
        ));
    }
    if !outcome.summary.is_empty() {
        out.push_str(&section(
            format!("CONVERSATION SUMMARY: {}", outcome.summary).cyan(),
        ));
    }
    out
}

pub fn error(message: impl Display) -> String {
    format!("\n{}", format!("Error: {}", message).red())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docassist::schemas::UserIntent;
    use docassist::{AgentResponse, IntentType, SimulatedRetriever};

    #[test]
    fn documents_list_amounts_with_labels() {
        let text = documents(SimulatedRetriever::new().documents());
        assert!(text.contains("ID: INV-001"));
        assert!(text.contains("Total: $22,000.00"));
        assert!(text.contains("Type: contract"));
    }

    #[test]
    fn outcome_skips_empty_sections() {
        let response: AgentResponse = serde_json::from_value(serde_json::json!({
            "kind": "answer",
            "answer": "INV-001 totals $22,000.",
            "sources": ["INV-001"],
            "confidence": 0.9
        }))
        .unwrap();
        let turn = TurnOutcome {
            response: Some(response),
            intent: Some(UserIntent {
                intent_type: IntentType::Qa,
                confidence: 0.9,
                reasoning: String::new(),
            }),
            tools_used: vec![],
            active_documents: vec!["INV-001".into()],
            summary: String::new(),
        };
        let text = outcome(&turn);
        assert!(text.contains("Assistant: INV-001 totals $22,000."));
        assert!(text.contains("INTENT: qa"));
        assert!(text.contains("SOURCES: INV-001"));
        assert!(!text.contains("TOOLS USED"));
        assert!(!text.contains("CONVERSATION SUMMARY"));
    }
}
