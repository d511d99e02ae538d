//! Chat engine
//!
//! Orchestrates the online path: embed the user message, retrieve diverse
//! evidence, merge with the session's history into one prompt, call the
//! generative model, record the turn. All collaborators are injected at
//! construction; there is no global state.

use crate::embedding::EmbeddingProvider;
use crate::error::{RaglineError, Result};
use crate::llm::GenerativeModel;
use crate::memory::{ConversationMemory, Turn};
use crate::prompt::{assemble, DEFAULT_PREAMBLE};
use crate::retrieval::{RetrievalResult, Retriever};
use std::sync::Arc;
use std::time::Duration;

/// Engine-level tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of documents to select per query
    pub k: usize,
    /// Size of the candidate pool MMR re-ranks (must be >= k)
    pub fetch_k: usize,
    /// Instructional preamble placed before the evidence block
    pub preamble: String,
    /// Upper bound on one generation call
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            k: 3,
            fetch_k: 6,
            preamble: DEFAULT_PREAMBLE.to_string(),
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// One completed chat exchange
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Session the turn was recorded under (generated when not supplied)
    pub session_id: String,
    /// The model's answer
    pub response: String,
    /// Deduplicated sources of the evidence behind the answer
    pub sources: Vec<String>,
}

/// Retrieval-augmented chat engine
pub struct ChatEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Retriever,
    memory: Arc<ConversationMemory>,
    model: Arc<dyn GenerativeModel>,
    config: EngineConfig,
}

impl ChatEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        retriever: Retriever,
        memory: Arc<ConversationMemory>,
        model: Arc<dyn GenerativeModel>,
        config: EngineConfig,
    ) -> Self {
        Self {
            embedder,
            retriever,
            memory,
            model,
            config,
        }
    }

    /// Answer one user message within a session
    ///
    /// A missing session id starts a fresh session. The response reflects all
    /// turns appended to the session before this call began. On generation
    /// failure no turn is recorded and the failure is surfaced as
    /// `GenerationUnavailable` — never an empty string presented as content.
    pub async fn chat(&self, session_id: Option<String>, message: &str) -> Result<ChatReply> {
        let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let query_vector = self.embedder.embed(message)?;
        let retrieved = self
            .retriever
            .retrieve(&query_vector, self.config.k, self.config.fetch_k)?;

        let history = self.memory.history(&session_id)?;
        let prompt = assemble(
            &self.config.preamble,
            &retrieved.evidence_text,
            &history,
            message,
        );

        tracing::debug!(
            "Session {}: {} evidence documents, {} history turns",
            session_id,
            retrieved.documents.len(),
            history.len()
        );

        let response = tokio::time::timeout(
            self.config.generation_timeout,
            self.model.generate(&prompt),
        )
        .await
        .map_err(|_| {
            RaglineError::GenerationUnavailable(format!(
                "generation timed out after {:?}",
                self.config.generation_timeout
            ))
        })??;

        self.memory.append(&session_id, message, &response)?;

        Ok(ChatReply {
            session_id,
            response,
            sources: retrieved.sources,
        })
    }

    /// Retrieve evidence for an already-embedded query
    pub fn retrieve(&self, query_vector: &[f32], k: usize, fetch_k: usize) -> Result<RetrievalResult> {
        self.retriever.retrieve(query_vector, k, fetch_k)
    }

    /// Record a turn directly, bypassing generation
    pub fn record_turn(&self, session_id: &str, user_message: &str, bot_response: &str) -> Result<()> {
        self.memory.append(session_id, user_message, bot_response)
    }

    /// A session's turns in insertion order
    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>> {
        self.memory.history(session_id)
    }
}
