//! In-memory checkpointer (MemorySaver). Not persistent; for tests and offline runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::checkpointer::{window, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

/// In-memory checkpointer keyed by `(thread_id, checkpoint_ns)`; each key
/// holds its checkpoints oldest first.
///
/// **Interaction**: Used as `Arc<dyn Checkpointer<S>>` in
/// `StateGraph::compile_with_checkpointer`. Cloning shares the same storage.
pub struct MemorySaver<S> {
    by_thread: Arc<RwLock<HashMap<ThreadKey, Vec<Checkpoint<S>>>>>,
}

type ThreadKey = (String, String);

impl<S> Clone for MemorySaver<S> {
    fn clone(&self) -> Self {
        Self {
            by_thread: Arc::clone(&self.by_thread),
        }
    }
}

impl<S> MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            by_thread: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn thread_key(config: &RunnableConfig) -> Result<ThreadKey, CheckpointError> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        Ok((thread_id, config.checkpoint_ns.clone()))
    }
}

impl<S> Default for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = Self::thread_key(config)?;
        let mut guard = self.by_thread.write().await;
        guard.entry(key).or_default().push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let list = match guard.get(&key) {
            Some(l) => l,
            None => return Ok(None),
        };
        let found = match &config.checkpoint_id {
            Some(cid) => list.iter().find(|cp| &cp.id == cid),
            None => list.last(),
        };
        Ok(found.map(|cp| (cp.clone(), cp.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let items = guard
            .get(&key)
            .map(|list| {
                list.iter()
                    .map(|cp| CheckpointListItem {
                        checkpoint_id: cp.id.clone(),
                        metadata: cp.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(window(items, limit, before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CheckpointSource;

    /// **Scenario**: put then get_tuple returns the latest checkpoint for that thread.
    #[tokio::test]
    async fn get_tuple_returns_latest() {
        let saver = MemorySaver::<Vec<String>>::new();
        let cfg = RunnableConfig::for_thread("t1");
        saver
            .put(&cfg, &Checkpoint::from_state(vec!["a".into()], CheckpointSource::Update, 1))
            .await
            .unwrap();
        let second = Checkpoint::from_state(vec!["a".into(), "b".into()], CheckpointSource::Update, 2);
        saver.put(&cfg, &second).await.unwrap();

        let (cp, meta) = saver.get_tuple(&cfg).await.unwrap().unwrap();
        assert_eq!(cp.id, second.id);
        assert_eq!(cp.channel_values.len(), 2);
        assert_eq!(meta.step, 2);
    }

    /// **Scenario**: Two thread ids never observe each other's checkpoints.
    #[tokio::test]
    async fn threads_are_isolated() {
        let saver = MemorySaver::<String>::new();
        let alice = RunnableConfig::for_thread("alice");
        let bob = RunnableConfig::for_thread("bob");
        saver
            .put(&alice, &Checkpoint::from_state("vegan".into(), CheckpointSource::Update, 1))
            .await
            .unwrap();

        assert!(saver.get_tuple(&bob).await.unwrap().is_none());
        assert!(saver.list(&bob, None, None, None).await.unwrap().is_empty());
        let (cp, _) = saver.get_tuple(&alice).await.unwrap().unwrap();
        assert_eq!(cp.channel_values, "vegan");
    }

    /// **Scenario**: Thread ids and namespaces containing ':' do not collide.
    #[tokio::test]
    async fn colon_in_thread_or_namespace_stays_isolated() {
        let saver = MemorySaver::<&'static str>::new();
        let first = RunnableConfig {
            checkpoint_ns: "b:c".into(),
            ..RunnableConfig::for_thread("a")
        };
        let second = RunnableConfig {
            checkpoint_ns: "c".into(),
            ..RunnableConfig::for_thread("a:b")
        };
        saver
            .put(&first, &Checkpoint::from_state("first", CheckpointSource::Update, 1))
            .await
            .unwrap();

        assert!(saver.get_tuple(&second).await.unwrap().is_none());
        saver
            .put(&second, &Checkpoint::from_state("second", CheckpointSource::Update, 1))
            .await
            .unwrap();
        let (cp, _) = saver.get_tuple(&first).await.unwrap().unwrap();
        assert_eq!(cp.channel_values, "first");
        assert_eq!(saver.list(&first, None, None, None).await.unwrap().len(), 1);
    }

    /// **Scenario**: Missing thread_id is rejected.
    #[tokio::test]
    async fn missing_thread_id_is_error() {
        let saver = MemorySaver::<i32>::new();
        let cp = Checkpoint::from_state(1, CheckpointSource::Update, 0);
        let err = saver.put(&RunnableConfig::default(), &cp).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }

    /// **Scenario**: checkpoint_id selects an older snapshot.
    #[tokio::test]
    async fn checkpoint_id_selects_specific_snapshot() {
        let saver = MemorySaver::<i32>::new();
        let cfg = RunnableConfig::for_thread("t");
        let first = Checkpoint::from_state(1, CheckpointSource::Update, 0);
        saver.put(&cfg, &first).await.unwrap();
        saver
            .put(&cfg, &Checkpoint::from_state(2, CheckpointSource::Update, 1))
            .await
            .unwrap();
        let cfg_old = RunnableConfig {
            checkpoint_id: Some(first.id.clone()),
            ..cfg
        };
        let (cp, _) = saver.get_tuple(&cfg_old).await.unwrap().unwrap();
        assert_eq!(cp.channel_values, 1);
    }
}
