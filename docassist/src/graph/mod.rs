//! Minimal state-graph runtime: nodes, explicit edges, conditional routing.
//!
//! Build a [`StateGraph`], `compile` it into a [`CompiledStateGraph`], then
//! `invoke` it with an initial state and an optional [`RunnableConfig`](crate::memory::RunnableConfig).

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod logging_middleware;
mod next;
mod node;
mod node_middleware;
mod retry;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::{CompiledStateGraph, DEFAULT_STEP_LIMIT};
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state, log_state_update,
};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeInner, NodeMiddleware};
pub use retry::RetryPolicy;
pub use state_graph::{StateGraph, END, START};
