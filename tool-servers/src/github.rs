//! GitHub issue tools over the REST API.
//!
//! Requests carry `User-Agent: MCP-GitHub-Server` and, when `GITHUB_TOKEN` is
//! set, a bearer token. `GITHUB_API_URL` points the client at another API
//! root (GitHub Enterprise, or a mock server in tests).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use docassist::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use docassist::tools::Tool;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = "MCP-GitHub-Server";

pub const TOOL_GET_LAST_ISSUE: &str = "get_last_issue";
pub const TOOL_GET_ISSUE: &str = "get_issue";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// The issue fields the tools return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: String,
    pub html_url: String,
}

pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// `GITHUB_API_URL` (default api.github.com) and optional `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        let api_url = std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(api_url, std::env::var("GITHUB_TOKEN").ok())
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, GithubError> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(%url, "GitHub request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Most recently created issue of any state; `None` when there are none.
    pub async fn last_issue(&self, owner: &str, repo: &str) -> Result<Option<Issue>, GithubError> {
        let list = self
            .get(
                &format!("/repos/{}/{}/issues", owner, repo),
                &[
                    ("state", "all"),
                    ("per_page", "1"),
                    ("sort", "created"),
                    ("direction", "desc"),
                ],
            )
            .await?;
        let first = match list {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            _ => return Ok(None),
        };
        Ok(Some(serde_json::from_value(first).map_err(|e| {
            GithubError::Status {
                status: 200,
                body: format!("unexpected issue shape: {}", e),
            }
        })?))
    }

    pub async fn issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue, GithubError> {
        let value = self
            .get(&format!("/repos/{}/{}/issues/{}", owner, repo, number), &[])
            .await?;
        serde_json::from_value(value).map_err(|e| GithubError::Status {
            status: 200,
            body: format!("unexpected issue shape: {}", e),
        })
    }
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolSourceError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("{} is required", key)))
}

/// Accepts a JSON number or a numeric string.
fn number_arg(args: &Value) -> Result<u64, ToolSourceError> {
    let value = args.get("number");
    value
        .and_then(Value::as_u64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolSourceError::InvalidInput("number must be a positive integer".into()))
}

fn request_failed(e: GithubError) -> ToolSourceError {
    ToolSourceError::Transport(e.to_string())
}

fn issue_json(issue: &Issue) -> Result<String, ToolSourceError> {
    serde_json::to_string(issue).map_err(|e| ToolSourceError::Transport(e.to_string()))
}

fn repo_schema(extra: Option<(&str, Value)>) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "owner": { "type": "string", "description": "Repository owner" },
            "repo": { "type": "string", "description": "Repository name" }
        },
        "required": ["owner", "repo"]
    });
    if let Some((name, property)) = extra {
        schema["properties"][name] = property;
        if let Some(required) = schema["required"].as_array_mut() {
            required.push(Value::String(name.to_string()));
        }
    }
    schema
}

pub struct GetLastIssueTool {
    client: Arc<GithubClient>,
}

impl GetLastIssueTool {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetLastIssueTool {
    fn name(&self) -> &str {
        TOOL_GET_LAST_ISSUE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_LAST_ISSUE.to_string(),
            description: Some(
                "Most recently created issue of a repository as JSON \
                 (number, title, body, created_at, html_url); {} when there are none."
                    .to_string(),
            ),
            input_schema: repo_schema(None),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let owner = str_arg(&args, "owner")?;
        let repo = str_arg(&args, "repo")?;
        let text = match self.client.last_issue(owner, repo).await.map_err(request_failed)? {
            Some(issue) => issue_json(&issue)?,
            None => "{}".to_string(),
        };
        Ok(ToolCallContent::new(text))
    }
}

pub struct GetIssueTool {
    client: Arc<GithubClient>,
}

impl GetIssueTool {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetIssueTool {
    fn name(&self) -> &str {
        TOOL_GET_ISSUE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_ISSUE.to_string(),
            description: Some("One issue of a repository by number, as JSON.".to_string()),
            input_schema: repo_schema(Some((
                "number",
                json!({ "type": "integer", "description": "Issue number" }),
            ))),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let owner = str_arg(&args, "owner")?;
        let repo = str_arg(&args, "repo")?;
        let number = number_arg(&args)?;
        let issue = self
            .client
            .issue(owner, repo, number)
            .await
            .map_err(request_failed)?;
        Ok(ToolCallContent::new(issue_json(&issue)?))
    }
}

pub fn github_tools(client: GithubClient) -> Vec<Arc<dyn Tool>> {
    let client = Arc::new(client);
    vec![
        Arc::new(GetLastIssueTool::new(client.clone())),
        Arc::new(GetIssueTool::new(client)),
    ]
}
