use async_trait::async_trait;
use serde_json::{json, Value};

use crate::retrieval::{format_amount, DocumentStatistics};
use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::logger::{log_shared, SharedToolLogger};
use crate::tools::Tool;

use super::SharedRetriever;

pub const TOOL_DOCUMENT_STATISTICS: &str = "document_statistics";

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub(crate) fn format_statistics(stats: &DocumentStatistics) -> String {
    let mut out = String::from("DOCUMENT COLLECTION STATISTICS:\n\n");
    out.push_str(&format!("Total Documents: {}\n", stats.total_documents));
    out.push_str(&format!(
        "Documents with Amounts: {}\n",
        stats.documents_with_amounts
    ));
    out.push_str("\nDocument Types:\n");
    for (doc_type, count) in &stats.document_types {
        out.push_str(&format!("  - {}: {}\n", capitalize(doc_type), count));
    }
    if stats.documents_with_amounts > 0 {
        let money = |v: Option<f64>| format_amount(v.unwrap_or_default());
        out.push_str("\nFinancial Summary:\n");
        out.push_str(&format!("  - Total Amount: ${}\n", format_amount(stats.total_amount)));
        out.push_str(&format!(
            "  - Average Amount: ${}\n",
            format_amount(stats.average_amount)
        ));
        out.push_str(&format!("  - Minimum Amount: ${}\n", money(stats.min_amount)));
        out.push_str(&format!("  - Maximum Amount: ${}\n", money(stats.max_amount)));
    }
    out
}

/// Counts and amount totals over the whole collection.
pub struct DocumentStatisticsTool {
    retriever: SharedRetriever,
    logger: SharedToolLogger,
}

impl DocumentStatisticsTool {
    pub fn new(retriever: SharedRetriever, logger: SharedToolLogger) -> Self {
        Self { retriever, logger }
    }
}

#[async_trait]
impl Tool for DocumentStatisticsTool {
    fn name(&self) -> &str {
        TOOL_DOCUMENT_STATISTICS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_DOCUMENT_STATISTICS.to_string(),
            description: Some(
                "Get statistics about all documents: counts per type, amount totals, averages, \
                 minimum and maximum."
                    .to_string(),
            ),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(
        &self,
        _args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let stats = self.retriever.read().await.get_statistics();
        log_shared(
            &self.logger,
            TOOL_DOCUMENT_STATISTICS,
            json!({}),
            json!({ "stats": stats }).to_string(),
        )
        .await;
        Ok(ToolCallContent::new(format_statistics(&stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::SimulatedRetriever;

    #[test]
    fn formats_sample_collection() {
        let text = format_statistics(&SimulatedRetriever::new().get_statistics());
        assert_eq!(
            text,
            "DOCUMENT COLLECTION STATISTICS:\n\n\
             Total Documents: 5\n\
             Documents with Amounts: 5\n\
             \nDocument Types:\n\
             \x20 - Invoice: 3\n\
             \x20 - Contract: 1\n\
             \x20 - Claim: 1\n\
             \nFinancial Summary:\n\
             \x20 - Total Amount: $488,250.00\n\
             \x20 - Average Amount: $97,650.00\n\
             \x20 - Minimum Amount: $2,450.00\n\
             \x20 - Maximum Amount: $214,500.00\n"
        );
    }

    /// **Scenario**: Without amounts the financial summary is omitted.
    #[test]
    fn empty_collection_has_no_financial_summary() {
        let text = format_statistics(&SimulatedRetriever::empty().get_statistics());
        assert!(text.contains("Total Documents: 0"));
        assert!(!text.contains("Financial Summary"));
    }
}
