//! Intent handlers: QA, summarization and calculation.
//!
//! All three run the same two-call shape. The first call lets the model pick
//! tools, and the tools run. The second call asks for the structured response
//! given the tool output. Whatever the model leaves out (sources, lengths,
//! the calculator result) is filled in from the tool output.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::structured::invoke_structured;
use crate::llm::{LlmClient, ToolCall};
use crate::message::Message;
use crate::prompts::{format_template, AssistantPrompts};
use crate::schemas::{
    AgentResponse, AnswerResponse, CalculationResponse, IntentType, SummarizationResponse,
};
use crate::tool_source::{ToolCallContext, ToolSource, ToolSourceError};
use crate::tools::{TOOL_CALCULATOR, TOOL_DOCUMENT_SEARCH};

use super::state::{
    union_ids, AgentState, STEP_CALCULATION, STEP_QA, STEP_SUMMARIZATION, STEP_UPDATE_MEMORY,
};

/// Prior messages replayed to the handler model.
const RECENT_MESSAGES: usize = 4;
/// `document_search` query used by the calculation handler when the model omits one.
const CALCULATION_DEFAULT_QUERY: &str = "total amount sum calculate";

fn doc_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ID: ([\w-]+)").unwrap_or_else(|e| panic!("doc id regex: {e}")))
}

fn calc_result_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"result.*?is\s*([\d.,]+)").unwrap_or_else(|e| panic!("calc result regex: {e}"))
    })
}

/// Document ids mentioned as `ID: XXX` in tool output.
pub fn extract_doc_ids(text: &str) -> Vec<String> {
    doc_id_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Number after "result ... is" in calculator output.
pub fn parse_calculator_result(text: &str) -> Option<f64> {
    let raw = calc_result_regex().captures(text)?.get(1)?.as_str();
    raw.replace(',', "").trim_end_matches('.').parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Qa,
    Summarization,
    Calculation,
}

impl HandlerKind {
    pub fn node_id(self) -> &'static str {
        match self {
            HandlerKind::Qa => STEP_QA,
            HandlerKind::Summarization => STEP_SUMMARIZATION,
            HandlerKind::Calculation => STEP_CALCULATION,
        }
    }

    fn intent(self) -> IntentType {
        match self {
            HandlerKind::Qa => IntentType::Qa,
            HandlerKind::Summarization => IntentType::Summarization,
            HandlerKind::Calculation => IntentType::Calculation,
        }
    }

    fn default_search_query(self, user_input: &str) -> String {
        match self {
            HandlerKind::Qa => user_input.to_string(),
            HandlerKind::Summarization => user_input
                .split_whitespace()
                .take(5)
                .collect::<Vec<_>>()
                .join(" "),
            HandlerKind::Calculation => CALCULATION_DEFAULT_QUERY.to_string(),
        }
    }
}

/// What the tool calls of one turn produced.
#[derive(Debug, Default)]
struct ToolRun {
    tools_used: Vec<String>,
    /// Deduplicated, first-seen order.
    doc_ids: Vec<String>,
    /// Characters of tool output.
    output_len: usize,
    calc_expression: Option<String>,
    calc_result: Option<f64>,
}

pub struct HandlerNode {
    kind: HandlerKind,
    llm: Arc<dyn LlmClient>,
    tools: Arc<dyn ToolSource>,
    prompts: Arc<AssistantPrompts>,
}

impl HandlerNode {
    pub fn new(
        kind: HandlerKind,
        llm: Arc<dyn LlmClient>,
        tools: Arc<dyn ToolSource>,
        prompts: Arc<AssistantPrompts>,
    ) -> Self {
        Self {
            kind,
            llm,
            tools,
            prompts,
        }
    }

    fn initial_messages(&self, state: &AgentState) -> Vec<Message> {
        let intent = self.kind.intent();
        let summary = if state.conversation_summary.trim().is_empty() {
            "No previous context"
        } else {
            state.conversation_summary.as_str()
        };
        let system = format!(
            "{}\n{}",
            format_template(
                self.prompts.chat_prompt_for(intent),
                &[("conversation_summary", summary)]
            ),
            format_template(
                &self.prompts.handler_for(intent).tool_instructions,
                &[("user_input", state.user_input.as_str())]
            )
        );

        // The classifier already appended this turn's input; it is re-added last.
        let current = Message::user(state.user_input.clone());
        let history = match state.messages.split_last() {
            Some((last, rest)) if *last == current => rest,
            _ => &state.messages[..],
        };
        let start = history.len().saturating_sub(RECENT_MESSAGES);

        let mut messages = vec![Message::system(system)];
        messages.extend(history[start..].iter().cloned());
        messages.push(current);
        messages
    }

    async fn run_tools(
        &self,
        state: &AgentState,
        calls: &[ToolCall],
        messages: &mut Vec<Message>,
    ) -> ToolRun {
        let ctx = ToolCallContext::new(state.session_id.clone(), state.user_id.clone());
        let mut run = ToolRun::default();
        for call in calls {
            let mut args = call.args();
            if call.name == TOOL_DOCUMENT_SEARCH && !args.contains_key("query") {
                args.insert(
                    "query".to_string(),
                    Value::String(self.kind.default_search_query(&state.user_input)),
                );
            }
            let expression = args
                .get("expression")
                .and_then(Value::as_str)
                .map(str::to_string);

            let text = match self
                .tools
                .call_tool_with_context(&call.name, Value::Object(args), Some(&ctx))
                .await
            {
                Ok(content) => content.text,
                Err(ToolSourceError::NotFound(name)) => {
                    tracing::warn!(tool = %name, "model called an unknown tool; skipped");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                    format!("Error calling {}: {}", call.name, e)
                }
            };
            tracing::debug!(tool = %call.name, output_len = text.len(), "tool call done");

            run.tools_used.push(call.name.clone());
            union_ids(&mut run.doc_ids, &extract_doc_ids(&text));
            run.output_len += text.chars().count();
            if call.name == TOOL_CALCULATOR {
                run.calc_expression = expression.or(run.calc_expression.take());
                if let Some(result) = parse_calculator_result(&text) {
                    run.calc_result = Some(result);
                }
            }
            messages.push(Message::tool_result(&call.name, &text));
        }
        run
    }

    async fn structured_response(
        &self,
        state: &AgentState,
        messages: &[Message],
        run: ToolRun,
    ) -> Result<AgentResponse, AgentError> {
        let llm = self.llm.as_ref();
        let input = state.user_input.clone();
        let response = match self.kind {
            HandlerKind::Qa => {
                let (raw, parsed) = invoke_structured::<AnswerResponse>(llm, messages).await?;
                let mut answer = parsed.unwrap_or_else(|_| AnswerResponse {
                    question: input.clone(),
                    answer: raw,
                    sources: Vec::new(),
                    confidence: 0.0,
                    timestamp: chrono::Utc::now(),
                });
                if answer.question.is_empty() {
                    answer.question = input;
                }
                if answer.sources.is_empty() {
                    answer.sources = run.doc_ids;
                }
                AgentResponse::Answer(answer)
            }
            HandlerKind::Summarization => {
                let (raw, parsed) =
                    invoke_structured::<SummarizationResponse>(llm, messages).await?;
                let mut summary = parsed.unwrap_or_else(|_| SummarizationResponse {
                    original_length: 0,
                    summary: raw,
                    key_points: Vec::new(),
                    document_ids: Vec::new(),
                    timestamp: chrono::Utc::now(),
                });
                if summary.document_ids.is_empty() {
                    summary.document_ids = run.doc_ids;
                }
                if summary.original_length == 0 {
                    summary.original_length = run.output_len;
                }
                AgentResponse::Summary(summary)
            }
            HandlerKind::Calculation => {
                let (raw, parsed) =
                    invoke_structured::<CalculationResponse>(llm, messages).await?;
                let mut calc = parsed.unwrap_or_else(|_| CalculationResponse {
                    expression: String::new(),
                    result: 0.0,
                    explanation: raw,
                    units: None,
                    timestamp: chrono::Utc::now(),
                });
                if let Some(result) = run.calc_result {
                    calc.result = result;
                }
                if calc.expression.is_empty() {
                    calc.expression = run.calc_expression.unwrap_or_default();
                }
                AgentResponse::Calculation(calc)
            }
        };
        Ok(response)
    }
}

#[async_trait]
impl Node<AgentState> for HandlerNode {
    fn id(&self) -> &str {
        self.kind.node_id()
    }

    async fn run(&self, state: AgentState) -> Result<(AgentState, Next), AgentError> {
        let mut messages = self.initial_messages(&state);
        let specs = self.tools.list_tools().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "listing tools failed; continuing without tools");
            Vec::new()
        });

        let response = self.llm.invoke_with_tools(&messages, &specs).await?;
        if !response.content.is_empty() {
            messages.push(Message::assistant(response.content.clone()));
        }
        let run = self.run_tools(&state, &response.tool_calls, &mut messages).await;
        let tools_used = run.tools_used.clone();

        let final_prompt = format_template(
            &self.prompts.handler_for(self.kind.intent()).final_prompt,
            &[("user_input", state.user_input.as_str())],
        );
        messages.push(Message::user(final_prompt));
        let agent_response = self.structured_response(&state, &messages, run).await?;

        let mut update = state.without_messages();
        update
            .messages
            .push(Message::assistant(agent_response.text().to_string()));
        update.current_response = Some(agent_response);
        update.tools_used = tools_used;
        update.next_step = STEP_UPDATE_MEMORY.to_string();
        Ok((update, Next::Continue))
    }
}
