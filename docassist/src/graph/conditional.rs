//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that reads the merged state and
//! returns a key; the key is looked up in an optional path map, and an
//! unmapped key is used as the node id itself.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Router function: reads the state and returns a routing key.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Routing function plus optional path map.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Next node id (or END): `path_map[key]` when mapped, else `key`.
    pub fn resolve_next(&self, state: &S) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }
}

/// How the compiled graph picks the successor of a node.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Fixed successor (or END). The node's own `Next` is still respected.
    Unconditional(String),
    /// Successor resolved from state; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: A mapped key resolves through the map; an unmapped key is returned as-is.
    #[test]
    fn resolve_next_uses_map_then_key() {
        let map: HashMap<String, String> = [("go".to_string(), "worker".to_string())]
            .into_iter()
            .collect();
        let router = ConditionalRouter::<String>::new(Arc::new(|s: &String| s.clone()), Some(map));
        assert_eq!(router.resolve_next(&"go".to_string()), "worker");
        assert_eq!(router.resolve_next(&"other".to_string()), "other");
    }
}
