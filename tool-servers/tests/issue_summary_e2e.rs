//! The issue summary workflow over the real server binaries: the github server
//! talks to a mock API, the filesystem server writes into a temp directory.


use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docassist::issue_summary::{run_issue_summary, SUMMARY_FILE};
use docassist::prompts::default_from_embedded;
use docassist::tool_source::{McpToolSource, MultiToolSource, ToolSource};
use docassist::MockLlm;
use env_config::McpServerConfig;

#[tokio::test(flavor = "multi_thread")]
async fn summary_of_last_issue_lands_in_base_dir() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "number": 3,
            "title": "Docs are outdated",
            "body": "The README still mentions v1.",
            "created_at": "2024-06-01T00:00:00Z",
            "html_url": "https://github.com/octo/demo/issues/3"
        }])))
        .mount(&api)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let github = McpServerConfig {
        command: env!("CARGO_BIN_EXE_github-server").to_string(),
        args: vec![],
        env: HashMap::from([("GITHUB_API_URL".to_string(), api.uri())]),
        transport: "stdio".to_string(),
    };
    let filesystem = McpServerConfig::stdio(
        env!("CARGO_BIN_EXE_filesystem-server"),
        vec![out_dir.path().display().to_string()],
    );

    let tools = MultiToolSource::new(vec![
        Box::new(McpToolSource::from_config(&github, false).await.unwrap()),
        Box::new(McpToolSource::from_config(&filesystem, false).await.unwrap()),
    ]);
    let names: Vec<String> = tools
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert!(names.contains(&"get_last_issue".to_string()));
    assert!(names.contains(&"write_file".to_string()));

    let llm = Arc::new(MockLlm::with_text("The README is out of date."));
    let state = run_issue_summary(
        llm,
        Arc::new(tools),
        Arc::new(default_from_embedded()),
        "octo",
        "demo",
    )
    .await
    .unwrap();

    assert_eq!(state.issue.unwrap().number, 3);
    assert_eq!(state.write_result, "Wrote 26 characters to summary.txt");
    assert_eq!(
        std::fs::read_to_string(out_dir.path().join(SUMMARY_FILE)).unwrap(),
        "The README is out of date."
    );
}
