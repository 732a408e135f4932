use async_trait::async_trait;
use serde_json::{json, Value};

use crate::retrieval::{format_amount, SimulatedRetriever};
use crate::schemas::DocumentChunk;
use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::logger::{log_shared, SharedToolLogger};
use crate::tools::Tool;

use super::{display_amount, f64_arg, str_arg, SharedRetriever};

pub const TOOL_DOCUMENT_SEARCH: &str = "document_search";

const NO_RESULTS: &str = "No documents found matching your search criteria.";
const PREVIEW_CHARS: usize = 200;

/// Parsed `document_search` arguments.
#[derive(Debug, Clone, Default, PartialEq)]
struct SearchArgs {
    query: String,
    search_type: String,
    doc_type: Option<String>,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
    comparison: Option<String>,
    amount: Option<f64>,
}

impl SearchArgs {
    fn parse(args: &Value) -> Result<Self, ToolSourceError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolSourceError::InvalidInput("missing query".to_string()))?;
        Ok(Self {
            query: query.to_string(),
            search_type: str_arg(args, "search_type").unwrap_or("keyword").to_string(),
            doc_type: str_arg(args, "doc_type").map(str::to_string),
            min_amount: f64_arg(args, "min_amount"),
            max_amount: f64_arg(args, "max_amount"),
            comparison: str_arg(args, "comparison").map(str::to_lowercase),
            amount: f64_arg(args, "amount"),
        })
    }

    fn has_amount_criteria(&self) -> bool {
        self.comparison.is_some() || self.min_amount.is_some() || self.max_amount.is_some()
    }

    fn log_input(&self) -> Value {
        json!({
            "query": self.query,
            "search_type": self.search_type,
            "doc_type": self.doc_type,
            "min_amount": self.min_amount,
            "max_amount": self.max_amount,
            "comparison": self.comparison,
            "amount": self.amount,
        })
    }
}

/// Runs the search described by `args`.
///
/// A `type` search with amount criteria keeps only the typed documents that
/// also pass the amount search. Unrecognized search types route on the query
/// text: amount words first, then a document type name, then keywords.
fn search(retriever: &SimulatedRetriever, args: &SearchArgs) -> Vec<DocumentChunk> {
    match (args.search_type.as_str(), args.doc_type.as_deref()) {
        ("keyword", _) => retriever.retrieve_by_keyword(&args.query, 3),
        ("type", Some(doc_type)) => {
            let typed = retriever.retrieve_by_type(doc_type);
            if !args.has_amount_criteria() {
                return typed;
            }
            let by_amount = amount_search(retriever, args);
            typed
                .into_iter()
                .filter(|c| by_amount.iter().any(|a| a.doc_id == c.doc_id))
                .collect()
        }
        ("amount" | "amount_range", _) => amount_search(retriever, args),
        _ => {
            let lower = args.query.to_lowercase();
            const AMOUNT_WORDS: [&str; 8] = [
                "over", "under", "above", "below", "between", "around", "exactly", "$",
            ];
            if AMOUNT_WORDS.iter().any(|w| lower.contains(w)) {
                return retriever.parse_and_retrieve_by_amount(&args.query);
            }
            match ["invoice", "contract", "claim"]
                .into_iter()
                .find(|t| lower.contains(t))
            {
                Some(doc_type) => retriever.retrieve_by_type(doc_type),
                None => retriever.retrieve_by_keyword(&args.query, 3),
            }
        }
    }
}

fn amount_search(retriever: &SimulatedRetriever, args: &SearchArgs) -> Vec<DocumentChunk> {
    match (args.comparison.as_deref(), args.amount) {
        (Some("over"), Some(a)) => return retriever.retrieve_by_amount_range(Some(a), None),
        (Some("under"), Some(a)) => return retriever.retrieve_by_amount_range(None, Some(a)),
        (Some("exact"), Some(a)) => return retriever.retrieve_by_exact_amount(a, 0.01),
        (Some("approximate"), Some(a)) => {
            return retriever.retrieve_by_approximate_amount(a, 10.0)
        }
        (Some("between"), _) => {
            if let (Some(min), Some(max)) = (args.min_amount, args.max_amount) {
                return retriever.retrieve_by_amount_range(Some(min), Some(max));
            }
        }
        _ => {}
    }
    if args.min_amount.is_some() || args.max_amount.is_some() {
        return retriever.retrieve_by_amount_range(args.min_amount, args.max_amount);
    }
    retriever.parse_and_retrieve_by_amount(&args.query)
}

/// Renders results as numbered blocks with amount, score and a content preview.
pub(crate) fn format_results(results: &[DocumentChunk]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    let mut out = format!("Found {} document(s):\n\n", results.len());
    for (i, chunk) in results.iter().enumerate() {
        let meta_str = |key: &str| {
            chunk
                .metadata
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string()
        };
        out.push_str(&format!("Document {} (ID: {}):\n", i + 1, chunk.doc_id));
        out.push_str(&format!("Title: {}\n", meta_str("title")));
        out.push_str(&format!("Type: {}\n", meta_str("doc_type")));
        if let Some(amount) = display_amount(&chunk.metadata) {
            out.push_str(&format!("Amount: ${}\n", format_amount(amount)));
        }
        out.push_str(&format!("Relevance Score: {:.2}\n", chunk.relevance_score));
        let preview: String = chunk.content.chars().take(PREVIEW_CHARS).collect();
        out.push_str(&format!("Preview: {}...\n", preview));
        out.push_str(&"-".repeat(50));
        out.push('\n');
    }
    out
}

/// Searches documents by keyword, type or amount, including natural-language amount queries.
pub struct DocumentSearchTool {
    retriever: SharedRetriever,
    logger: SharedToolLogger,
}

impl DocumentSearchTool {
    pub fn new(retriever: SharedRetriever, logger: SharedToolLogger) -> Self {
        Self { retriever, logger }
    }
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        TOOL_DOCUMENT_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_DOCUMENT_SEARCH.to_string(),
            description: Some(
                "Search for relevant documents using various criteria. Handles natural language \
                 amount queries such as \"invoices over $50,000\", \"documents between $20,000 and \
                 $80,000\" or \"contracts around $100,000\". Results include document IDs, titles, \
                 types, amounts and a preview."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query, e.g. \"invoices over $50,000\", \"contracts\", \"insurance claims\"."
                    },
                    "search_type": {
                        "type": "string",
                        "enum": ["keyword", "type", "amount", "amount_range"],
                        "default": "keyword"
                    },
                    "doc_type": {
                        "type": "string",
                        "description": "Document type filter: invoice, contract or claim."
                    },
                    "min_amount": { "type": "number" },
                    "max_amount": { "type": "number" },
                    "comparison": {
                        "type": "string",
                        "enum": ["over", "under", "between", "exact", "approximate"]
                    },
                    "amount": {
                        "type": "number",
                        "description": "Single amount for over/under/exact/approximate comparisons."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let args = SearchArgs::parse(&args)?;
        let results = {
            let retriever = self.retriever.read().await;
            search(&retriever, &args)
        };
        tracing::debug!(
            query = %args.query,
            search_type = %args.search_type,
            results = results.len(),
            "document_search"
        );
        log_shared(
            &self.logger,
            TOOL_DOCUMENT_SEARCH,
            args.log_input(),
            json!({ "results_count": results.len() }).to_string(),
        )
        .await;
        Ok(ToolCallContent::new(format_results(&results)))
    }
}
