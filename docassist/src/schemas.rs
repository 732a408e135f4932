//! Structured records exchanged between the LLM, the agent nodes and the
//! session store.
//!
//! Response types deserialize leniently from model output: timestamps and
//! list fields default when missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved piece of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub doc_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub relevance_score: f64,
}

/// Answer to a question about the documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub question: String,
    pub answer: String,
    /// Document ids cited.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Between 0 and 1.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationResponse {
    /// Characters of source text the summary was built from.
    #[serde(default)]
    pub original_length: usize,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub document_ids: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub result: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Output of the memory-update step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemoryResponse {
    pub summary: String,
    /// Documents relevant to the last user message.
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Qa,
    Summarization,
    Calculation,
    #[default]
    Unknown,
}

impl IntentType {
    pub const ALL: [IntentType; 4] = [
        IntentType::Qa,
        IntentType::Summarization,
        IntentType::Calculation,
        IntentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Qa => "qa",
            IntentType::Summarization => "summarization",
            IntentType::Calculation => "calculation",
            IntentType::Unknown => "unknown",
        }
    }

    /// Exact label match, case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|i| i.as_str() == label)
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIntent {
    pub intent_type: IntentType,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// The structured reply of whichever handler ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentResponse {
    Answer(AnswerResponse),
    Summary(SummarizationResponse),
    Calculation(CalculationResponse),
}

impl AgentResponse {
    /// The user-facing text: answer, summary or explanation.
    pub fn text(&self) -> &str {
        match self {
            AgentResponse::Answer(a) => &a.answer,
            AgentResponse::Summary(s) => &s.summary,
            AgentResponse::Calculation(c) => &c.explanation,
        }
    }

    /// Documents the response relies on. Calculations carry none.
    pub fn document_ids(&self) -> &[String] {
        match self {
            AgentResponse::Answer(a) => &a.sources,
            AgentResponse::Summary(s) => &s.document_ids,
            AgentResponse::Calculation(_) => &[],
        }
    }
}

/// One user message and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub agent_response: AgentResponse,
    #[serde(default)]
    pub intent: Option<UserIntent>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Persisted session, stored as `{sessions_dir}/{session_id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    /// Active document ids.
    #[serde(default)]
    pub document_context: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            conversation_history: Vec::new(),
            document_context: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }
}
