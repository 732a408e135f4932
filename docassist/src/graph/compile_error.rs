//! Graph compilation error, returned by `StateGraph::compile`.

use thiserror::Error;

/// Structural problem found while compiling a [`StateGraph`](super::StateGraph).
#[derive(Debug, Error)]
pub enum CompilationError {
    /// An edge or router refers to an id that was never added (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge leaves START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// Nothing can reach END.
    #[error("graph has no path to END")]
    MissingEnd,

    /// Branching or cyclic plain edges.
    #[error("invalid edge chain: {0}")]
    InvalidChain(String),

    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A path-map value is neither a node id nor END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}
