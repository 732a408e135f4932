//! Scripted LLM for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::tool_source::ToolSpec;

fn poisoned<T>(_: T) -> AgentError {
    AgentError::ExecutionFailed("mock llm lock poisoned".into())
}

/// One recorded call: the messages sent and the names of the tools offered.
#[derive(Clone, Debug)]
pub struct MockCall {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// Mock LLM: pops scripted responses in order and repeats the last one once
/// the script runs out. Every call is recorded.
pub struct MockLlm {
    script: Mutex<VecDeque<LlmResponse>>,
    last: Mutex<LlmResponse>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(LlmResponse::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `content` and no tool calls.
    pub fn with_text(content: impl Into<String>) -> Self {
        Self::new(vec![LlmResponse::text(content)])
    }

    /// Text-only script.
    pub fn scripted<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(texts.into_iter().map(LlmResponse::text).collect())
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn next_response(&self) -> Result<LlmResponse, AgentError> {
        let mut script = self.script.lock().map_err(poisoned)?;
        let mut last = self.last.lock().map_err(poisoned)?;
        if let Some(next) = script.pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    fn record(&self, messages: &[Message], tools: &[ToolSpec]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.record(messages, &[]);
        self.next_response()
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        self.record(messages, tools);
        self.next_response()
    }
}
