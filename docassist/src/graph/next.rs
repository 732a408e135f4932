//! What a node asks the runner to do after it returns.

/// Next step after running a node.
///
/// Ignored when the node has conditional edges; the router decides instead.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the node's outgoing edge; end if there is none.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
