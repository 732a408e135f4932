//! The assistant workflow end to end with a scripted LLM: classification,
//! handler tool calls, memory update and session persistence.


use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;

use docassist::agent::STEP_END;
use docassist::llm::ToolCall;
use docassist::prompts::default_from_embedded;
use docassist::tools::{document_tool_source, TOOL_CALCULATOR, TOOL_DOCUMENT_READER};
use docassist::{
    build_workflow, AgentResponse, AgentState, AssistantConfig, DocumentAssistant, IntentType,
    LlmResponse, MockLlm, SimulatedRetriever, ToolLogger,
};

#[tokio::test]
async fn calculation_turn_runs_classifier_handler_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlm::new(vec![
        LlmResponse::text(r#"{"intent_type": "calculation", "confidence": 0.95, "reasoning": "sum"}"#),
        LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                TOOL_CALCULATOR,
                json!({"expression": "22000 + 69300 + 214500"}),
            )],
        ),
        LlmResponse::text(
            r#"{"expression": "22000 + 69300 + 214500", "result": 0, "explanation": "Added the three invoice totals."}"#,
        ),
    ]));
    let tools = Arc::new(document_tool_source(
        Arc::new(RwLock::new(SimulatedRetriever::new())),
        ToolLogger::shared(dir.path(), Some("calc")),
    ));
    let workflow = build_workflow(llm.clone(), tools, Arc::new(default_from_embedded()), None).unwrap();

    let out = workflow
        .invoke(
            AgentState::for_turn("What is the sum of all invoices?", "calc", "tester"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(out.intent.as_ref().unwrap().intent_type, IntentType::Calculation);
    assert_eq!(out.next_step, STEP_END);
    assert_eq!(out.tools_used, vec![TOOL_CALCULATOR]);
    match out.current_response.as_ref().unwrap() {
        AgentResponse::Calculation(c) => assert_eq!(c.result, 305800.0),
        other => panic!("unexpected response {:?}", other),
    }
    // user input from the classifier, then the handler's reply
    assert_eq!(out.messages.len(), 2);
    assert_eq!(out.messages[1].content(), "Added the three invoice totals.");
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn unusable_classifier_reply_falls_back_to_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockLlm::new(vec![
        LlmResponse::text("I am not sure."),
        LlmResponse::text("Three invoices, one contract and one claim."),
    ]));
    let tools = Arc::new(document_tool_source(
        Arc::new(RwLock::new(SimulatedRetriever::new())),
        ToolLogger::shared(dir.path(), None),
    ));
    let workflow = build_workflow(llm, tools, Arc::new(default_from_embedded()), None).unwrap();
    let out = workflow
        .invoke(
            AgentState::for_turn("Give me an overview of the documents", "s", "u"),
            None,
        )
        .await
        .unwrap();
    let intent = out.intent.unwrap();
    assert_eq!(intent.intent_type, IntentType::Summarization);
    assert_eq!(intent.confidence, 0.5);
    match out.current_response.unwrap() {
        AgentResponse::Summary(s) => {
            assert_eq!(s.summary, "Three invoices, one contract and one claim.")
        }
        other => panic!("unexpected response {:?}", other),
    }
    assert!(out.tools_used.is_empty());
    assert_eq!(out.next_step, STEP_END);
}

#[tokio::test]
async fn assistant_reads_an_added_document_and_persists_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = AssistantConfig {
        sessions_dir: dir.path().join("sessions"),
        logs_dir: dir.path().join("logs"),
        ..AssistantConfig::default()
    };
    std::fs::create_dir_all(&config.sessions_dir).unwrap();
    let llm = Arc::new(MockLlm::new(vec![
        LlmResponse::text(r#"{"intent_type": "qa", "confidence": 0.9, "reasoning": "lookup"}"#),
        LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new(TOOL_DOCUMENT_READER, json!({"doc_id": "RPT-001"}))],
        ),
        LlmResponse::text(
            r#"{"question": "What is RPT-001?", "answer": "A quarterly report.", "sources": ["RPT-001"], "confidence": 0.8}"#,
        ),
    ]));
    let mut assistant = DocumentAssistant::new(config.clone(), llm).unwrap();
    let mut metadata = serde_json::Map::new();
    metadata.insert("total".into(), json!(1234.5));
    assistant
        .add_document("RPT-001", "Q3 Report", "Quarterly figures.", "report", Some(metadata))
        .await
        .unwrap();

    let session_id = assistant.start_session("tester", Some("it-1")).unwrap();
    assert_eq!(session_id, "it-1");
    let outcome = assistant.process_message("What is RPT-001?").await.unwrap();

    assert_eq!(outcome.response.unwrap().text(), "A quarterly report.");
    assert_eq!(outcome.active_documents, vec!["RPT-001"]);
    assert_eq!(outcome.tools_used, vec![TOOL_DOCUMENT_READER]);

    let logs = assistant.tool_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].tool_name, TOOL_DOCUMENT_READER);
    let logged: serde_json::Value = serde_json::from_str(&logs[0].output).unwrap();
    assert_eq!(logged, json!({"found": true, "doc_type": "report"}));
    assert!(config.logs_dir.join("session_it-1.json").is_file());

    let saved = std::fs::read_to_string(config.sessions_dir.join("it-1.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["document_context"], json!(["RPT-001"]));
    assert_eq!(saved["conversation_history"].as_array().unwrap().len(), 1);
}
