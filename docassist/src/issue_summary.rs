//! GitHub issue summary over MCP tool servers.
//!
//! A linear graph: `fetch_issue -> summarize -> write_summary`. The issue comes
//! from a github server's `get_last_issue` tool and the summary is written
//! through a filesystem server's `write_file` tool. Both are reached through
//! one [`ToolSource`], normally a [`MultiToolSource`](crate::tool_source::MultiToolSource)
//! over two [`McpToolSource`](crate::tool_source::McpToolSource)s.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::{format_template, AssistantPrompts};
use crate::tool_source::ToolSource;

pub const TOOL_GET_LAST_ISSUE: &str = "get_last_issue";
pub const TOOL_WRITE_FILE: &str = "write_file";
/// File the summary is written to, relative to the filesystem server's base directory.
pub const SUMMARY_FILE: &str = "summary.txt";

/// Issue fields returned by the github server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueSummaryState {
    pub owner: String,
    pub repo: String,
    /// `None` when the repository has no issues.
    pub issue: Option<GithubIssue>,
    pub summary: String,
    /// Relative path written, once `write_summary` ran.
    pub summary_path: Option<String>,
    /// Confirmation text from the filesystem server.
    pub write_result: String,
}

impl IssueSummaryState {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            ..Self::default()
        }
    }
}

fn tool_failed(step: &str, e: impl std::fmt::Display) -> AgentError {
    AgentError::ExecutionFailed(format!("{}: {}", step, e))
}

/// Parses the `get_last_issue` result; `{}` means no issues.
pub fn parse_issue(text: &str) -> Result<Option<GithubIssue>, AgentError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| tool_failed("fetch_issue: invalid JSON from github server", e))?;
    match &value {
        Value::Object(map) if map.is_empty() => Ok(None),
        _ => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| tool_failed("fetch_issue: unexpected issue shape", e)),
    }
}

struct FetchIssueNode {
    tools: Arc<dyn ToolSource>,
}

#[async_trait]
impl Node<IssueSummaryState> for FetchIssueNode {
    fn id(&self) -> &str {
        "fetch_issue"
    }

    async fn run(&self, state: IssueSummaryState) -> Result<(IssueSummaryState, Next), AgentError> {
        let content = self
            .tools
            .call_tool(
                TOOL_GET_LAST_ISSUE,
                json!({ "owner": state.owner, "repo": state.repo }),
            )
            .await
            .map_err(|e| tool_failed("fetch_issue", e))?;
        let issue = parse_issue(&content.text)?;
        tracing::info!(
            repo = %format!("{}/{}", state.owner, state.repo),
            number = issue.as_ref().map(|i| i.number),
            "fetched last issue"
        );
        Ok((IssueSummaryState { issue, ..state }, Next::Continue))
    }
}

struct SummarizeNode {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<AssistantPrompts>,
}

#[async_trait]
impl Node<IssueSummaryState> for SummarizeNode {
    fn id(&self) -> &str {
        "summarize"
    }

    async fn run(&self, state: IssueSummaryState) -> Result<(IssueSummaryState, Next), AgentError> {
        let summary = match &state.issue {
            None => format!("No issues found in {}/{}.", state.owner, state.repo),
            Some(issue) => {
                let repository = format!("{}/{}", state.owner, state.repo);
                let number = issue.number.to_string();
                let prompt = format_template(
                    &self.prompts.issue_summary,
                    &[
                        ("repository", repository.as_str()),
                        ("number", number.as_str()),
                        ("title", issue.title.as_str()),
                        ("body", issue.body.as_deref().unwrap_or("")),
                    ],
                );
                let response = self.llm.invoke(&[Message::user(prompt)]).await?;
                response.content.trim().to_string()
            }
        };
        Ok((IssueSummaryState { summary, ..state }, Next::Continue))
    }
}

struct WriteSummaryNode {
    tools: Arc<dyn ToolSource>,
}

#[async_trait]
impl Node<IssueSummaryState> for WriteSummaryNode {
    fn id(&self) -> &str {
        "write_summary"
    }

    async fn run(&self, state: IssueSummaryState) -> Result<(IssueSummaryState, Next), AgentError> {
        let content = self
            .tools
            .call_tool(
                TOOL_WRITE_FILE,
                json!({ "relative_path": SUMMARY_FILE, "content": state.summary }),
            )
            .await
            .map_err(|e| tool_failed("write_summary", e))?;
        tracing::info!(result = %content.text, "summary written");
        Ok((
            IssueSummaryState {
                summary_path: Some(SUMMARY_FILE.to_string()),
                write_result: content.text,
                ..state
            },
            Next::Continue,
        ))
    }
}

pub fn build_issue_summary_graph(
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    prompts: Arc<AssistantPrompts>,
) -> Result<CompiledStateGraph<IssueSummaryState>, CompilationError> {
    let mut graph = StateGraph::<IssueSummaryState>::new();
    graph
        .add_node("fetch_issue", Arc::new(FetchIssueNode { tools: tools.clone() }))
        .add_node("summarize", Arc::new(SummarizeNode { llm, prompts }))
        .add_node("write_summary", Arc::new(WriteSummaryNode { tools }))
        .add_edge(START, "fetch_issue")
        .add_edge("fetch_issue", "summarize")
        .add_edge("summarize", "write_summary")
        .add_edge("write_summary", END);
    graph.compile()
}

/// Builds the graph and runs it for `owner/repo`.
pub async fn run_issue_summary(
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    prompts: Arc<AssistantPrompts>,
    owner: &str,
    repo: &str,
) -> Result<IssueSummaryState, AgentError> {
    let graph = build_issue_summary_graph(llm, tools, prompts)
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
    graph.invoke(IssueSummaryState::new(owner, repo), None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::prompts::default_from_embedded;
    use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
    use std::sync::Mutex;

    struct FakeServers {
        issue_json: String,
        writes: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ToolSource for FakeServers {
        async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
            Ok(vec![])
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Value,
        ) -> Result<ToolCallContent, ToolSourceError> {
            match name {
                TOOL_GET_LAST_ISSUE => Ok(ToolCallContent::new(self.issue_json.clone())),
                TOOL_WRITE_FILE => {
                    let len = arguments["content"].as_str().unwrap_or("").chars().count();
                    self.writes.lock().unwrap().push(arguments);
                    Ok(ToolCallContent::new(format!(
                        "Wrote {} characters to {}",
                        len, SUMMARY_FILE
                    )))
                }
                other => Err(ToolSourceError::NotFound(other.to_string())),
            }
        }
    }

    fn servers(issue_json: &str) -> Arc<FakeServers> {
        Arc::new(FakeServers {
            issue_json: issue_json.to_string(),
            writes: Mutex::new(Vec::new()),
        })
    }

    /// **Scenario**: The last issue is summarized by the LLM and written to summary.txt.
    #[tokio::test]
    async fn summarizes_and_writes_last_issue() {
        let fake = servers(
            r#"{"number": 42, "title": "Crash on start", "body": "Stack trace attached", "created_at": "2024-05-01T00:00:00Z", "html_url": "https://github.com/o/r/issues/42"}"#,
        );
        let llm = Arc::new(MockLlm::with_text("  The app crashes at startup.  "));
        let state = run_issue_summary(
            llm.clone(),
            fake.clone(),
            Arc::new(default_from_embedded()),
            "o",
            "r",
        )
        .await
        .unwrap();

        assert_eq!(state.issue.as_ref().unwrap().number, 42);
        assert_eq!(state.summary, "The app crashes at startup.");
        assert_eq!(state.summary_path.as_deref(), Some(SUMMARY_FILE));
        assert_eq!(state.write_result, "Wrote 27 characters to summary.txt");

        let prompt = llm.calls()[0].messages[0].content().to_string();
        assert!(prompt.contains("Repository: o/r"));
        assert!(prompt.contains("Issue #42: Crash on start"));

        let writes = fake.writes.lock().unwrap();
        assert_eq!(writes[0]["relative_path"], SUMMARY_FILE);
    }

    /// **Scenario**: An empty issue list skips the LLM and writes the no-issues line.
    #[tokio::test]
    async fn no_issues() {
        let fake = servers("{}");
        let llm = Arc::new(MockLlm::with_text("unused"));
        let state = run_issue_summary(
            llm.clone(),
            fake.clone(),
            Arc::new(default_from_embedded()),
            "o",
            "empty",
        )
        .await
        .unwrap();
        assert!(state.issue.is_none());
        assert_eq!(state.summary, "No issues found in o/empty.");
        assert_eq!(llm.call_count(), 0);
        assert_eq!(
            fake.writes.lock().unwrap()[0]["content"],
            "No issues found in o/empty."
        );
    }

    #[test]
    fn parse_issue_rejects_garbage() {
        assert!(parse_issue("not json").is_err());
        assert_eq!(parse_issue(" {} ").unwrap(), None);
        let issue = parse_issue(r#"{"number": 1, "title": "t", "body": null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(issue.body, None);
    }
}
