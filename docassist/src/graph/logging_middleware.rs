//! Middleware that traces node enter/exit around each run.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;
use crate::graph::Next;

use super::{NodeInner, NodeMiddleware};

/// Emits `tracing` events on node enter and exit. Only the node id and the
/// routing decision are logged, never the state.
pub struct LoggingNodeMiddleware<S> {
    _phantom: std::marker::PhantomData<S>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeInner<S>,
    ) -> Result<(S, Next), AgentError> {
        tracing::info!(node = node_id, "enter node");
        let started = std::time::Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok((_, next)) => tracing::info!(node = node_id, ?next, elapsed_ms, "exit node"),
            Err(e) => tracing::warn!(node = node_id, error = %e, elapsed_ms, "node failed"),
        }
        result
    }
}
