use async_trait::async_trait;
use serde_json::{json, Value};

use crate::retrieval::format_amount;
use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::logger::{log_shared, SharedToolLogger};
use crate::tools::Tool;

use super::{display_amount, str_arg, SharedRetriever};

pub const TOOL_DOCUMENT_READER: &str = "document_reader";

/// Returns the full content of one document by id.
pub struct DocumentReaderTool {
    retriever: SharedRetriever,
    logger: SharedToolLogger,
}

impl DocumentReaderTool {
    pub fn new(retriever: SharedRetriever, logger: SharedToolLogger) -> Self {
        Self { retriever, logger }
    }
}

#[async_trait]
impl Tool for DocumentReaderTool {
    fn name(&self) -> &str {
        TOOL_DOCUMENT_READER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_DOCUMENT_READER.to_string(),
            description: Some(
                "Read the full content of a specific document by its ID (e.g. 'INV-001', 'CON-001')."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "doc_id": {
                        "type": "string",
                        "description": "The exact document ID to read."
                    }
                },
                "required": ["doc_id"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let doc_id = str_arg(&args, "doc_id")
            .ok_or_else(|| ToolSourceError::InvalidInput("missing doc_id".to_string()))?;
        let chunk = self.retriever.read().await.get_document_by_id(doc_id);

        let (text, output) = match chunk {
            Some(chunk) => {
                let amount = display_amount(&chunk.metadata)
                    .map(|a| format!("\nAmount: ${}", format_amount(a)))
                    .unwrap_or_default();
                (
                    format!("Document {}:{}\n\n{}", doc_id, amount, chunk.content),
                    json!({ "found": true, "doc_type": chunk.metadata.get("doc_type") }),
                )
            }
            None => (
                format!("Document with ID {} not found.", doc_id),
                json!({ "found": false }),
            ),
        };
        log_shared(
            &self.logger,
            TOOL_DOCUMENT_READER,
            json!({ "doc_id": doc_id }),
            output.to_string(),
        )
        .await;
        Ok(ToolCallContent::new(text))
    }
}
