//! Checkpointer trait and CheckpointError.

use async_trait::async_trait;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::config::RunnableConfig;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Saves and loads checkpoints by (thread_id, checkpoint_ns, checkpoint_id).
///
/// Implementations: [`MemorySaver`](super::MemorySaver), [`SqliteSaver`](super::SqliteSaver).
///
/// **Interaction**: Injected via `StateGraph::compile_with_checkpointer`;
/// `CompiledStateGraph::invoke` calls `put` when `config.thread_id` is set.
/// The assistant calls `get_tuple` to restore the message log of a session.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Persists a checkpoint for the config's thread. Returns the checkpoint id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Latest checkpoint for the thread, or the one named by `config.checkpoint_id`.
    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError>;

    /// Checkpoints of the thread, oldest first. `before`/`after` are exclusive
    /// checkpoint ids; `limit` keeps the newest `n`.
    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

/// Applies the shared `after` / `before` / `limit` window to an oldest-first list.
pub(crate) fn window(
    mut items: Vec<CheckpointListItem>,
    limit: Option<usize>,
    before: Option<&str>,
    after: Option<&str>,
) -> Vec<CheckpointListItem> {
    if let Some(a) = after {
        if let Some(pos) = items.iter().position(|i| i.checkpoint_id == a) {
            items = items.split_off(pos + 1);
        }
    }
    if let Some(b) = before {
        if let Some(pos) = items.iter().position(|i| i.checkpoint_id == b) {
            items.truncate(pos);
        }
    }
    if let Some(n) = limit {
        let len = items.len();
        if len > n {
            items = items.split_off(len - n);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> CheckpointListItem {
        CheckpointListItem {
            checkpoint_id: id.to_string(),
            metadata: CheckpointMetadata::default(),
        }
    }

    fn ids(items: &[CheckpointListItem]) -> Vec<&str> {
        items.iter().map(|i| i.checkpoint_id.as_str()).collect()
    }

    /// **Scenario**: Display of each CheckpointError variant contains expected keywords.
    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::ThreadIdRequired.to_string().contains("thread"));
        assert!(CheckpointError::Serialization("e".into())
            .to_string()
            .contains("serialization"));
        assert!(CheckpointError::Storage("io".into()).to_string().contains("storage"));
        assert!(CheckpointError::NotFound("x".into())
            .to_string()
            .contains("not found"));
    }

    /// **Scenario**: after/before are exclusive and limit keeps the newest entries.
    #[test]
    fn window_applies_after_before_and_limit() {
        let all = vec![item("a"), item("b"), item("c"), item("d")];
        assert_eq!(ids(&window(all.clone(), None, None, Some("a"))), ["b", "c", "d"]);
        assert_eq!(ids(&window(all.clone(), None, Some("c"), None)), ["a", "b"]);
        assert_eq!(ids(&window(all.clone(), Some(2), None, None)), ["c", "d"]);
        assert_eq!(ids(&window(all, Some(1), Some("d"), Some("a"))), ["c"]);
    }
}
