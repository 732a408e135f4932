//! The REPL driven with scripted input against an offline assistant.


use std::sync::Arc;

use docassist::{AssistantConfig, DocumentAssistant, LlmResponse, MockLlm};

use cli::repl::run_repl;

fn assistant(dir: &std::path::Path, llm: Arc<MockLlm>) -> DocumentAssistant {
    let config = AssistantConfig {
        sessions_dir: dir.join("sessions"),
        logs_dir: dir.join("logs"),
        ..AssistantConfig::default()
    };
    DocumentAssistant::new(config, llm).unwrap()
}

async fn drive(assistant: &mut DocumentAssistant, input: &str) -> String {
    let mut out = Vec::new();
    run_repl(assistant, input.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn docs_command_lists_the_collection_and_quit_ends() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = assistant(dir.path(), Arc::new(MockLlm::with_text(cli::OFFLINE_REPLY)));
    assistant.start_session("tester", Some("repl-docs")).unwrap();

    let out = drive(&mut assistant, "/docs\n/QUIT\nnever read\n").await;

    assert!(out.contains("AVAILABLE COMMANDS"));
    assert!(out.contains("ID: INV-002"));
    assert!(out.contains("Goodbye!"));
    assert!(!out.contains("Processing..."));
}

#[tokio::test]
async fn offline_message_uses_keyword_intent() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = assistant(dir.path(), Arc::new(MockLlm::with_text(cli::OFFLINE_REPLY)));
    assistant.start_session("tester", Some("repl-offline")).unwrap();

    let out = drive(&mut assistant, "Summarize all contracts\n").await;

    assert!(out.contains("Processing..."));
    assert!(out.contains("Assistant: Offline mode"));
    assert!(out.contains("INTENT: summarization"));
    // EOF ends the loop like /quit
    assert!(out.trim_end().ends_with("Goodbye!"));
    assert_eq!(assistant.get_session_history().len(), 1);
    assert!(dir.path().join("sessions/repl-offline.json").is_file());
}

#[tokio::test]
async fn failed_turn_is_printed_and_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mut assistant = assistant(
        dir.path(),
        Arc::new(MockLlm::new(vec![LlmResponse::text("qa")])),
    );
    // no session started: every turn fails
    let out = drive(&mut assistant, "What is INV-001?\n/docs\n").await;

    assert!(out.contains("Error: "));
    assert!(out.contains("ID: INV-001"));
    assert!(out.contains("Goodbye!"));
}
