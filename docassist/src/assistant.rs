//! Session-owning facade over the workflow: the API the CLI talks to.
//!
//! A session is a JSON file under the sessions directory. The chat log of a
//! session lives in the checkpointer under `thread_id = session_id`, so
//! resumed sessions continue with their prior messages.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::agent::{build_workflow, render_turns, union_ids, AgentState};
use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph};
use crate::llm::{ChatOpenAI, LlmClient};
use crate::memory::{CheckpointError, Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, SqliteSaver};
use crate::message::Message;
use crate::prompts::{format_template, load_or_default, AssistantPrompts};
use crate::retrieval::{Document, RetrieverError, SimulatedRetriever};
use crate::schemas::{AgentResponse, ConversationTurn, SessionState, UserIntent};
use crate::tools::{document_tool_source, SharedRetriever, SharedToolLogger, ToolLogEntry, ToolLogger};

/// Summary used before the first turn.
pub const NO_PREVIOUS_CONVERSATION: &str = "No previous conversation.";
/// Turns rendered into the conversation summary.
const SUMMARY_TURNS: usize = 5;
/// Past this many turns the summary is written by the LLM.
const LLM_SUMMARY_AFTER_TURNS: usize = 3;
const SUMMARY_MAX_WORDS: &str = "100";

/// Session ids name files under the sessions and logs directories, so only
/// `[A-Za-z0-9_-]` is accepted.
pub fn validate_session_id(id: &str) -> Result<(), AssistantError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AssistantError::InvalidSessionId(id.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no active session; call start_session first")]
    NoSession,
    #[error("invalid session id {0:?}: use letters, digits, '-' or '_'")]
    InvalidSessionId(String),
    #[error("session io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Retriever(#[from] RetrieverError),
}

/// Assistant settings, normally read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    pub model: String,
    pub temperature: f32,
    pub sessions_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// OpenAI-compatible endpoint; `None` uses the client default.
    pub base_url: Option<String>,
    /// `None` lets the client read `OPENAI_API_KEY` itself.
    pub api_key: Option<String>,
    /// SQLite checkpoint file; `None` keeps checkpoints in memory.
    pub checkpoint_db: Option<PathBuf>,
    /// Directory holding an `assistant.yaml` override.
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            sessions_dir: PathBuf::from("./sessions"),
            logs_dir: PathBuf::from("./logs"),
            base_url: None,
            api_key: None,
            checkpoint_db: None,
            prompts_dir: None,
        }
    }
}

impl AssistantConfig {
    /// Reads `DOCASSIST_MODEL`, `DOCASSIST_TEMPERATURE`, `DOCASSIST_SESSIONS_DIR`,
    /// `DOCASSIST_LOGS_DIR`, `DOCASSIST_CHECKPOINT_DB`, `OPENAI_BASE_URL` and
    /// `OPENAI_API_KEY`. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            model: var("DOCASSIST_MODEL").unwrap_or(defaults.model),
            temperature: var("DOCASSIST_TEMPERATURE")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.temperature),
            sessions_dir: var("DOCASSIST_SESSIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.sessions_dir),
            logs_dir: var("DOCASSIST_LOGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.logs_dir),
            base_url: var("OPENAI_BASE_URL"),
            api_key: var("OPENAI_API_KEY"),
            checkpoint_db: var("DOCASSIST_CHECKPOINT_DB").map(PathBuf::from),
            prompts_dir: None,
        }
    }

    /// OpenAI chat client for this config.
    pub fn openai_client(&self) -> ChatOpenAI {
        let config = ChatOpenAI::config_from(self.api_key.as_deref(), self.base_url.as_deref());
        ChatOpenAI::with_config(config, self.model.clone()).with_temperature(self.temperature)
    }
}

/// Result of one processed message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// `None` when the workflow produced no response.
    pub response: Option<AgentResponse>,
    pub intent: Option<UserIntent>,
    pub tools_used: Vec<String>,
    /// Document context of the session after this turn.
    pub active_documents: Vec<String>,
    /// Conversation summary the turn was run with.
    pub summary: String,
}

pub struct DocumentAssistant {
    config: AssistantConfig,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<AssistantPrompts>,
    retriever: SharedRetriever,
    logger: SharedToolLogger,
    workflow: CompiledStateGraph<AgentState>,
    checkpointer: Arc<dyn Checkpointer<AgentState>>,
    session: Option<SessionState>,
}

impl DocumentAssistant {
    /// Assistant over the OpenAI client described by `config`.
    pub fn from_config(config: AssistantConfig) -> Result<Self, AssistantError> {
        let llm = Arc::new(config.openai_client());
        Self::new(config, llm)
    }

    /// Assistant over any LLM client (e.g. [`MockLlm`](crate::llm::MockLlm) offline).
    pub fn new(config: AssistantConfig, llm: Arc<dyn LlmClient>) -> Result<Self, AssistantError> {
        std::fs::create_dir_all(&config.sessions_dir)?;
        let prompts = Arc::new(load_or_default(config.prompts_dir.as_deref()));
        let retriever: SharedRetriever = Arc::new(RwLock::new(SimulatedRetriever::new()));
        let logger = ToolLogger::shared(&config.logs_dir, None);
        let tools = Arc::new(document_tool_source(retriever.clone(), logger.clone()));

        let checkpointer: Arc<dyn Checkpointer<AgentState>> = match &config.checkpoint_db {
            Some(path) => Arc::new(SqliteSaver::<AgentState>::new(path, Arc::new(JsonSerializer))?),
            None => Arc::new(MemorySaver::<AgentState>::new()),
        };
        let workflow = build_workflow(
            llm.clone(),
            tools,
            prompts.clone(),
            Some(checkpointer.clone()),
        )?;
        tracing::info!(
            model = %config.model,
            sessions_dir = %config.sessions_dir.display(),
            persistent_checkpoints = config.checkpoint_db.is_some(),
            "document assistant ready"
        );

        Ok(Self {
            config,
            llm,
            prompts,
            retriever,
            logger,
            workflow,
            checkpointer,
            session: None,
        })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.config.sessions_dir.join(format!("{}.json", session_id))
    }

    /// Resumes `session_id` when its file exists, otherwise starts a new
    /// session (a fresh uuid when no id is given). Returns the session id.
    pub fn start_session(
        &mut self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<String, AssistantError> {
        if let Some(id) = session_id {
            validate_session_id(id)?;
        }
        let existing = session_id
            .map(|id| self.session_path(id))
            .filter(|p| p.is_file());
        let session = match existing {
            Some(path) => {
                let session: SessionState = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
                tracing::info!(session_id = %session.session_id, turns = session.conversation_history.len(), "resumed session");
                session
            }
            None => {
                let id = session_id
                    .map(str::to_string)
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                tracing::info!(session_id = %id, user_id, "started new session");
                SessionState::new(id, user_id)
            }
        };
        let id = session.session_id.clone();
        validate_session_id(&id)?;

        match self.logger.lock() {
            Ok(mut logger) => *logger = ToolLogger::new(&self.config.logs_dir, Some(&id)),
            Err(_) => tracing::warn!("tool logger lock poisoned; keeping previous log file"),
        }
        self.session = Some(session);
        Ok(id)
    }

    pub fn current_session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    fn save_session(&self) -> Result<(), AssistantError> {
        if let Some(session) = &self.session {
            let json = serde_json::to_string_pretty(session)?;
            std::fs::write(self.session_path(&session.session_id), json)?;
        }
        Ok(())
    }

    /// "No previous conversation." without history; the last turns otherwise,
    /// condensed by the LLM once the session is long enough. An LLM failure
    /// keeps the plain rendering.
    pub async fn conversation_summary(&self) -> String {
        let history = match &self.session {
            Some(s) if !s.conversation_history.is_empty() => &s.conversation_history,
            _ => return NO_PREVIOUS_CONVERSATION.to_string(),
        };
        let text = render_turns(history, SUMMARY_TURNS);
        if history.len() <= LLM_SUMMARY_AFTER_TURNS {
            return text;
        }
        let prompt = format_template(
            &self.prompts.memory_summary,
            &[
                ("conversation_history", text.as_str()),
                ("max_length", SUMMARY_MAX_WORDS),
            ],
        );
        match self.llm.invoke(&[Message::user(prompt)]).await {
            Ok(r) if !r.content.trim().is_empty() => r.content.trim().to_string(),
            Ok(_) => text,
            Err(e) => {
                tracing::warn!(error = %e, "conversation summary failed; using recent turns");
                text
            }
        }
    }

    async fn prior_messages(&self, session_id: &str) -> Result<Vec<Message>, AssistantError> {
        let config = RunnableConfig::for_thread(session_id);
        Ok(self
            .checkpointer
            .get_tuple(&config)
            .await?
            .map(|(checkpoint, _)| checkpoint.channel_values.messages)
            .unwrap_or_default())
    }

    /// Runs one turn of the workflow and records it in the session.
    pub async fn process_message(&mut self, user_input: &str) -> Result<TurnOutcome, AssistantError> {
        let (session_id, user_id, history, documents) = match &self.session {
            Some(s) => (
                s.session_id.clone(),
                s.user_id.clone(),
                s.conversation_history.clone(),
                s.document_context.clone(),
            ),
            None => return Err(AssistantError::NoSession),
        };
        let summary = self.conversation_summary().await;

        let mut state = AgentState::for_turn(user_input, session_id.clone(), user_id);
        state.messages = self.prior_messages(&session_id).await?;
        state.conversation_history = history;
        state.conversation_summary = summary.clone();
        state.active_documents = documents;

        let final_state = self
            .workflow
            .invoke(state, Some(RunnableConfig::for_thread(session_id.clone())))
            .await?;

        let session = self.session.as_mut().ok_or(AssistantError::NoSession)?;
        if let Some(response) = &final_state.current_response {
            session.conversation_history.push(ConversationTurn {
                user_input: user_input.to_string(),
                agent_response: response.clone(),
                intent: final_state.intent.clone(),
                tools_used: final_state.tools_used.clone(),
                timestamp: chrono::Utc::now(),
            });
            union_ids(&mut session.document_context, &final_state.active_documents);
            session.last_updated = chrono::Utc::now();
            self.save_session()?;
        } else {
            tracing::warn!(session_id = %session_id, "workflow finished without a response");
        }

        let active_documents = self
            .session
            .as_ref()
            .map(|s| s.document_context.clone())
            .unwrap_or_default();
        Ok(TurnOutcome {
            response: final_state.current_response,
            intent: final_state.intent,
            tools_used: final_state.tools_used,
            active_documents,
            summary,
        })
    }

    pub fn get_session_history(&self) -> &[ConversationTurn] {
        self.session
            .as_ref()
            .map(|s| s.conversation_history.as_slice())
            .unwrap_or(&[])
    }

    /// Writes the tool usage log of the current session to `path`.
    pub fn export_logs(&self, path: impl AsRef<Path>) -> Result<(), AssistantError> {
        let logger = self
            .logger
            .lock()
            .map_err(|_| std::io::Error::other("tool logger lock poisoned"))?;
        logger.save_logs(path)?;
        Ok(())
    }

    pub fn tool_logs(&self) -> Vec<ToolLogEntry> {
        self.logger
            .lock()
            .map(|l| l.get_logs().to_vec())
            .unwrap_or_default()
    }

    pub async fn add_document(
        &self,
        doc_id: &str,
        title: &str,
        content: &str,
        doc_type: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Result<(), AssistantError> {
        let document = Document::new(doc_id, title, content, doc_type, metadata.unwrap_or_default());
        self.retriever.write().await.add_document(document)?;
        tracing::info!(doc_id, "added document");
        Ok(())
    }

    /// Snapshot of every stored document, in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.retriever.read().await.documents().to_vec()
    }
}
