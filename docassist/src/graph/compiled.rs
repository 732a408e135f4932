//! Compiled state graph: immutable, supports `invoke`.
//!
//! When a checkpointer is attached and `config.thread_id` is set, the final
//! state is saved after the run.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::BoxedStateUpdater;
use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state, log_state_update,
};
use super::node_middleware::NodeMiddleware;
use super::retry::RetryPolicy;
use super::state_graph::END;
use super::{Next, NextEntry, Node};

/// Node runs allowed per `invoke` unless overridden with `StateGraph::with_step_limit`.
pub const DEFAULT_STEP_LIMIT: usize = 100;

/// Executable graph produced by `StateGraph::compile*`.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    /// Successor rule per node id. Nodes without an entry end the run on `Continue`.
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
    pub(super) retry_policy: RetryPolicy,
    pub(super) step_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// The checkpointer given to `compile_with_checkpointer`, if any.
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    async fn execute_node_with_retry(
        &self,
        node: Arc<dyn Node<S>>,
        state: &S,
    ) -> Result<(S, Next), AgentError> {
        let mut attempt = 0;
        loop {
            let current_state = state.clone();
            let result = if let Some(middleware) = &self.middleware {
                let node_id = node.id().to_string();
                let node_clone = node.clone();
                middleware
                    .around_run(
                        &node_id,
                        current_state,
                        Box::new(move |s| Box::pin(async move { node_clone.run(s).await })),
                    )
                    .await
            } else {
                node.run(current_state).await
            };

            match result {
                Ok(output) => return Ok(output),
                Err(e) if self.retry_policy.should_retry(attempt) => {
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(
                        node_id = node.id(),
                        attempt = attempt + 1,
                        error = %e,
                        "node failed, retrying"
                    );
                    if delay > std::time::Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Successor of `current_id` given the merged state and the node's `Next`.
    /// `None` means the run is over.
    fn resolve_next(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        let target = match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state);
                tracing::debug!(from = %current_id, to = %target, "conditional routing");
                Some(target)
            }
            entry => match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => match entry {
                    Some(NextEntry::Unconditional(id)) => Some(id.clone()),
                    _ => None,
                },
            },
        };
        target.filter(|t| t != END)
    }

    async fn run_loop(
        &self,
        state: &mut S,
        config: Option<&RunnableConfig>,
    ) -> Result<usize, AgentError> {
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;

        loop {
            if steps >= self.step_limit {
                return Err(AgentError::ExecutionFailed(format!(
                    "step limit of {} exceeded at node {}",
                    self.step_limit, current_id
                )));
            }
            let node = self.nodes.get(&current_id).cloned().ok_or_else(|| {
                AgentError::ExecutionFailed(format!("unknown node: {}", current_id))
            })?;

            log_node_start(&current_id);
            log_node_state(&current_id, state);

            let (update, next) = self.execute_node_with_retry(node, state).await?;
            steps += 1;

            log_node_complete(&current_id, &next);
            self.state_updater.apply_update(state, &update);
            log_state_update(&current_id);

            match self.resolve_next(&current_id, state, next) {
                Some(id) => current_id = id,
                None => break,
            }
        }

        if let (Some(cp), Some(cfg)) = (&self.checkpointer, config) {
            if cfg.thread_id.is_some() {
                let checkpoint =
                    Checkpoint::from_state(state.clone(), CheckpointSource::Update, steps as i64);
                let id = cp
                    .put(cfg, &checkpoint)
                    .await
                    .map_err(|e| AgentError::ExecutionFailed(format!("checkpoint: {}", e)))?;
                tracing::debug!(checkpoint_id = %id, thread_id = ?cfg.thread_id, "checkpoint saved");
            }
        }
        Ok(steps)
    }

    /// Runs the graph from the first node until END, a node returning
    /// `Next::End`, or a node with no successor.
    ///
    /// Pass `config` with `thread_id` to save the final state through the
    /// checkpointer; `None` runs without persistence.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        if self.nodes.is_empty() || !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        log_graph_start();
        let mut state = state;
        match self.run_loop(&mut state, config.as_ref()).await {
            Ok(steps) => {
                log_graph_complete(steps);
                Ok(state)
            }
            Err(e) => {
                log_graph_error(&e);
                Err(e)
            }
        }
    }
}
