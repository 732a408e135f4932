//! Per-invoke config: which thread (and optionally which checkpoint) to use.

/// Config for a single `invoke`. Identifies the thread and optional checkpoint.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and to
/// `Checkpointer::put` / `get_tuple` / `list`. The assistant uses the session id
/// as `thread_id`.
#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Conversation/thread key. Required by every checkpointer call.
    pub thread_id: Option<String>,
    /// When set, `get_tuple` loads this checkpoint instead of the latest.
    pub checkpoint_id: Option<String>,
    /// Optional namespace inside a thread. Empty by default.
    pub checkpoint_ns: String,
    /// Owner of the thread; informational.
    pub user_id: Option<String>,
}

impl RunnableConfig {
    /// Config for the given thread with everything else defaulted.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }
}
