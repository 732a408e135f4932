//! Per-call context handed to tools.

/// Who is calling a tool. Built by the agent nodes from the conversation state.
///
/// [`ToolLogger`](crate::tools::ToolLogger)-aware sources can use
/// `session_id` to group log entries; other sources ignore it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallContext {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl ToolCallContext {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            user_id: Some(user_id.into()),
        }
    }
}
