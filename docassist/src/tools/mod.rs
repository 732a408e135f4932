//! In-process tools: the [`Tool`] trait, a registry, and the document assistant's tools.
//!
//! Every document tool reads the shared retriever and appends to the shared
//! [`ToolLogger`]. [`all_tools`] builds the set the agent nodes use.

mod aggregate_source;
mod calculator;
pub mod documents;
mod logger;
mod registry;
mod r#trait;

pub use aggregate_source::AggregateToolSource;
pub use calculator::{evaluate, CalcError, CalculatorTool, TOOL_CALCULATOR};
pub use documents::{
    DocumentReaderTool, DocumentSearchTool, DocumentStatisticsTool, SharedRetriever,
    TOOL_DOCUMENT_READER, TOOL_DOCUMENT_SEARCH, TOOL_DOCUMENT_STATISTICS,
};
pub use logger::{SharedToolLogger, ToolLogEntry, ToolLogger};
pub use r#trait::Tool;
pub use registry::{ToolRegistry, ToolRegistryLocked};

use std::sync::Arc;

/// calculator, document_search, document_reader and document_statistics.
pub fn all_tools(retriever: SharedRetriever, logger: SharedToolLogger) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CalculatorTool::new(logger.clone())),
        Arc::new(DocumentSearchTool::new(retriever.clone(), logger.clone())),
        Arc::new(DocumentReaderTool::new(retriever.clone(), logger.clone())),
        Arc::new(DocumentStatisticsTool::new(retriever, logger)),
    ]
}

/// [`AggregateToolSource`] over [`all_tools`].
pub fn document_tool_source(retriever: SharedRetriever, logger: SharedToolLogger) -> AggregateToolSource {
    AggregateToolSource::from_tools(all_tools(retriever, logger))
}
