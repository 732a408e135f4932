//! StateGraph through the public API: linear runs, conditional routing,
//! explicit `Next` jumps and checkpoint persistence.


use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use docassist::{
    AgentError, Checkpointer, MemorySaver, Next, Node, RunnableConfig, StateGraph, END, START,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
    value: i64,
    trail: Vec<String>,
}

struct Add {
    id: &'static str,
    amount: i64,
    next: Next,
}

#[async_trait]
impl Node<Counter> for Add {
    fn id(&self) -> &str {
        self.id
    }

    async fn run(&self, state: Counter) -> Result<(Counter, Next), AgentError> {
        let mut trail = state.trail.clone();
        trail.push(self.id.to_string());
        Ok((
            Counter {
                value: state.value + self.amount,
                trail,
            },
            self.next.clone(),
        ))
    }
}

fn add(id: &'static str, amount: i64) -> Arc<dyn Node<Counter>> {
    Arc::new(Add {
        id,
        amount,
        next: Next::Continue,
    })
}

#[tokio::test]
async fn linear_chain_runs_every_node_in_order() {
    let mut graph = StateGraph::<Counter>::new();
    graph
        .add_node("a", add("a", 1))
        .add_node("b", add("b", 10))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", END);
    let compiled = graph.compile().unwrap();
    let out = compiled.invoke(Counter::default(), None).await.unwrap();
    assert_eq!(out.value, 11);
    assert_eq!(out.trail, vec!["a", "b"]);
}

#[tokio::test]
async fn conditional_edges_route_on_state() {
    let mut graph = StateGraph::<Counter>::new();
    graph
        .add_node("start", add("start", 5))
        .add_node("big", add("big", 100))
        .add_node("small", add("small", 1))
        .add_edge(START, "start")
        .add_edge("big", END)
        .add_edge("small", END);
    let path_map: HashMap<String, String> = [("big", "big"), ("small", "small")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    graph.add_conditional_edges(
        "start",
        Arc::new(|s: &Counter| {
            if s.value > 3 {
                "big".to_string()
            } else {
                "small".to_string()
            }
        }),
        Some(path_map),
    );
    let compiled = graph.compile().unwrap();

    let out = compiled.invoke(Counter::default(), None).await.unwrap();
    assert_eq!(out.trail, vec!["start", "big"]);

    let out = compiled
        .invoke(
            Counter {
                value: -10,
                trail: vec![],
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(out.trail, vec!["start", "small"]);
}

#[tokio::test]
async fn next_end_stops_before_the_edge_target() {
    let mut graph = StateGraph::<Counter>::new();
    graph
        .add_node(
            "stop",
            Arc::new(Add {
                id: "stop",
                amount: 1,
                next: Next::End,
            }),
        )
        .add_node("never", add("never", 1000))
        .add_edge(START, "stop")
        .add_edge("stop", "never")
        .add_edge("never", END);
    let out = graph
        .compile()
        .unwrap()
        .invoke(Counter::default(), None)
        .await
        .unwrap();
    assert_eq!(out.value, 1);
}

#[tokio::test]
async fn final_state_is_checkpointed_per_thread() {
    let saver: Arc<dyn Checkpointer<Counter>> = Arc::new(MemorySaver::<Counter>::new());
    let mut graph = StateGraph::<Counter>::new();
    graph
        .add_node("a", add("a", 2))
        .add_edge(START, "a")
        .add_edge("a", END);
    let compiled = graph.compile_with_checkpointer(saver.clone()).unwrap();

    let config = RunnableConfig::for_thread("t-1");
    compiled
        .invoke(Counter::default(), Some(config.clone()))
        .await
        .unwrap();
    let (checkpoint, _) = saver.get_tuple(&config).await.unwrap().unwrap();
    assert_eq!(checkpoint.channel_values.value, 2);

    let other = RunnableConfig::for_thread("t-2");
    assert!(saver.get_tuple(&other).await.unwrap().is_none());

    // No thread id: nothing saved.
    compiled.invoke(Counter::default(), None).await.unwrap();
    assert_eq!(saver.list(&config, None, None, None).await.unwrap().len(), 1);
}

/// Fails until it has been called `fail_times` times.
struct Flaky {
    calls: std::sync::atomic::AtomicUsize,
    fail_times: usize,
}

#[async_trait]
impl Node<Counter> for Flaky {
    fn id(&self) -> &str {
        "flaky"
    }

    async fn run(&self, state: Counter) -> Result<(Counter, Next), AgentError> {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n < self.fail_times {
            return Err(AgentError::ExecutionFailed(format!("attempt {} failed", n)));
        }
        Ok((
            Counter {
                value: state.value + 1,
                trail: state.trail,
            },
            Next::Continue,
        ))
    }
}

fn flaky_graph(
    fail_times: usize,
    policy: docassist::graph::RetryPolicy,
) -> (docassist::CompiledStateGraph<Counter>, Arc<Flaky>) {
    let node = Arc::new(Flaky {
        calls: Default::default(),
        fail_times,
    });
    let mut graph = StateGraph::<Counter>::new().with_retry_policy(policy);
    graph
        .add_node("flaky", node.clone())
        .add_edge(START, "flaky")
        .add_edge("flaky", END);
    (graph.compile().unwrap(), node)
}

#[tokio::test]
async fn retry_policy_reruns_a_failing_node() {
    let policy = docassist::graph::RetryPolicy::fixed(2, std::time::Duration::ZERO);
    let (graph, node) = flaky_graph(2, policy);

    let out = graph.invoke(Counter::default(), None).await.unwrap();

    assert_eq!(out.value, 1);
    assert_eq!(node.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn without_retry_the_first_error_is_returned() {
    let (graph, node) = flaky_graph(1, docassist::graph::RetryPolicy::none());

    let err = graph.invoke(Counter::default(), None).await.unwrap_err();

    assert!(err.to_string().contains("attempt 0 failed"));
    assert_eq!(node.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Counts its runs and keeps routing back to itself.
struct Spin {
    runs: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl Node<Counter> for Spin {
    fn id(&self) -> &str {
        "spin"
    }

    async fn run(&self, state: Counter) -> Result<(Counter, Next), AgentError> {
        self.runs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok((state, Next::Continue))
    }
}

fn spin_graph(graph: StateGraph<Counter>) -> (docassist::CompiledStateGraph<Counter>, Arc<Spin>) {
    let spin = Arc::new(Spin {
        runs: Default::default(),
    });
    let mut graph = graph;
    graph
        .add_node("spin", spin.clone())
        .add_edge(START, "spin")
        .add_conditional_edges("spin", Arc::new(|_: &Counter| "spin".to_string()), None);
    (graph.compile().unwrap(), spin)
}

#[tokio::test]
async fn conditional_cycle_stops_at_the_step_limit() {
    let (graph, spin) = spin_graph(StateGraph::<Counter>::new().with_step_limit(3));

    let err = graph.invoke(Counter::default(), None).await.unwrap_err();

    assert!(matches!(err, AgentError::ExecutionFailed(_)));
    assert!(err.to_string().contains("step limit of 3 exceeded at node spin"));
    assert_eq!(spin.runs.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn default_step_limit_is_one_hundred_runs() {
    let (graph, spin) = spin_graph(StateGraph::<Counter>::new());

    let err = graph.invoke(Counter::default(), None).await.unwrap_err();

    assert!(err.to_string().contains("step limit of 100 exceeded"));
    assert_eq!(
        spin.runs.load(std::sync::atomic::Ordering::SeqCst),
        docassist::graph::DEFAULT_STEP_LIMIT
    );
}

#[tokio::test]
async fn unknown_router_key_fails_the_run() {
    let mut graph = StateGraph::<Counter>::new();
    graph
        .add_node("a", add("a", 1))
        .add_edge(START, "a")
        .add_conditional_edges("a", Arc::new(|_: &Counter| "nowhere".to_string()), None);
    let compiled = graph.compile().unwrap();

    let err = compiled.invoke(Counter::default(), None).await.unwrap_err();

    assert!(matches!(err, AgentError::ExecutionFailed(_)));
    assert!(err.to_string().contains("unknown node: nowhere"));
}

#[test]
fn graph_without_nodes_does_not_compile() {
    let err = StateGraph::<Counter>::new().compile().err().unwrap();
    assert!(matches!(err, docassist::CompilationError::MissingStart));
}
