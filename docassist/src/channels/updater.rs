//! State updater: how a node's output is merged into the running state.
//!
//! Conversation state mixes two kinds of fields. The message log is
//! append-only: a node emits only the messages it produced and the runtime
//! appends them in order. Every other field (routing label, accumulated
//! collections, counters) is replaced wholesale by the node's value, never
//! mutated in place. `FieldBasedUpdater` expresses that split per state type.

use std::fmt::Debug;
use std::sync::Arc;

/// Merges a node's output into the current state.
///
/// Called by the compiled graph after every node run, before routing.
pub trait StateUpdater<S>: Send + Sync + Debug
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Folds `update` (the node output) into `current`.
    fn apply_update(&self, current: &mut S, update: &S);
}

/// Replaces the whole state with the node output. Used when no updater is set.
#[derive(Debug, Clone, Default)]
pub struct ReplaceUpdater;

impl<S> StateUpdater<S> for ReplaceUpdater
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        *current = update.clone();
    }
}

/// Updater defined by a closure that decides, field by field, whether to
/// append or replace.
pub struct FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    updater_fn: F,
    _marker: std::marker::PhantomData<S>,
}

impl<S, F> Debug for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBasedUpdater").finish_non_exhaustive()
    }
}

impl<S, F> FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    /// Creates an updater from a merge closure.
    ///
    /// ```rust,no_run
    /// use docassist::channels::FieldBasedUpdater;
    ///
    /// #[derive(Clone, Debug)]
    /// struct Lending { messages: Vec<String>, borrowed: Vec<String> }
    ///
    /// let updater = FieldBasedUpdater::new(|cur: &mut Lending, upd: &Lending| {
    ///     cur.messages.extend(upd.messages.iter().cloned());
    ///     cur.borrowed = upd.borrowed.clone();
    /// });
    /// ```
    pub fn new(updater_fn: F) -> Self {
        Self {
            updater_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S, F> StateUpdater<S> for FieldBasedUpdater<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(&mut S, &S) + Send + Sync + 'static,
{
    fn apply_update(&self, current: &mut S, update: &S) {
        (self.updater_fn)(current, update);
    }
}

/// Shared, type-erased updater held by the graph.
pub type BoxedStateUpdater<S> = Arc<dyn StateUpdater<S>>;

/// Wraps any updater into a [`BoxedStateUpdater`].
pub fn boxed_updater<S, U>(updater: U) -> BoxedStateUpdater<S>
where
    S: Clone + Send + Sync + Debug + 'static,
    U: StateUpdater<S> + 'static,
{
    Arc::new(updater)
}
