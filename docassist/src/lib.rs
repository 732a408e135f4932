//! # DocAssist
//!
//! An intent-routed document assistant built on a small state graph runtime.
//! One shared state type flows through nodes; each node returns an update that
//! the graph folds into the running state.
//!
//! ## Flow
//!
//! A user turn enters [`agent::ClassifyIntentNode`], which labels it as
//! question answering, summarization or calculation. The matching
//! [`agent::HandlerNode`] calls the document tools through a [`ToolSource`]
//! and asks the LLM for a structured response. [`agent::UpdateMemoryNode`] then
//! folds the referenced document ids into the conversation context.
//! [`DocumentAssistant`] wraps the compiled graph with sessions, checkpoints
//! and tool logs.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`].
//! - [`agent`]: the assistant workflow and its [`AgentState`].
//! - [`retrieval`]: [`SimulatedRetriever`] over in-memory [`Document`]s.
//! - [`tools`]: calculator and document tools, [`ToolLogger`], [`AggregateToolSource`].
//! - [`tool_source`]: [`ToolSource`] and the MCP client ([`McpToolSource`]).
//! - [`llm`]: [`LlmClient`], [`MockLlm`], [`ChatOpenAI`], structured output parsing.
//! - [`memory`]: [`Checkpointer`], [`MemorySaver`], [`SqliteSaver`].
//! - [`schemas`]: intent, response and session types.
//! - [`prompts`]: YAML prompt templates.
//! - [`issue_summary`]: GitHub issue summary over MCP tool servers.

pub mod agent;
pub mod assistant;
pub mod channels;
pub mod error;
pub mod graph;
pub mod issue_summary;
pub mod llm;
pub mod memory;
pub mod message;
pub mod prompts;
pub mod retrieval;
pub mod schemas;
pub mod tool_source;
pub mod tools;

pub use agent::{build_workflow, AgentState};
pub use assistant::{AssistantConfig, AssistantError, DocumentAssistant, TurnOutcome};
pub use error::AgentError;
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END, START};
pub use issue_summary::{run_issue_summary, IssueSummaryState};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, MockLlm};
pub use memory::{Checkpointer, MemorySaver, RunnableConfig, SqliteSaver};
pub use message::Message;
pub use prompts::AssistantPrompts;
pub use retrieval::{Document, SimulatedRetriever};
pub use schemas::{AgentResponse, IntentType, UserIntent};
pub use tool_source::{McpToolSource, MultiToolSource, ToolSource, ToolSpec};
pub use tools::{AggregateToolSource, Tool, ToolLogger};
