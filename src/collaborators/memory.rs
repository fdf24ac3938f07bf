//! Conversation memory boundary for per-session turn history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// One recorded exchange in a session's conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    /// What the customer asked.
    pub input: String,
    /// What the workflow answered.
    pub output: String,
    /// When the turn was recorded.
    pub at: DateTime<Utc>,
}

/// Narrow interface to per-session conversation history.
///
/// The workflow only ever appends completed turns and reads them back in
/// recorded order; edits and deletes are out of scope at this boundary.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Record one completed `(input, output)` exchange for a session.
    async fn append(
        &self,
        session_id: &str,
        input: &str,
        output: &str,
    ) -> Result<(), MemoryError>;

    /// All recorded turns for a session, oldest first.
    ///
    /// A session with no history yields an empty list, not an error.
    async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>, MemoryError>;
}

/// Failures surfaced by a [`ConversationMemory`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MemoryError {
    /// The memory backend failed.
    #[error("conversation memory backend failed: {message}")]
    #[diagnostic(code(supportflow::collaborators::memory_backend))]
    Backend { message: String },
}

/// Process-local [`ConversationMemory`] backed by a hash map.
///
/// The reference backend for demos and tests; history vanishes with the
/// process. Turns are kept in append order per session.
#[derive(Default)]
pub struct InMemoryConversationMemory {
    turns: RwLock<FxHashMap<String, Vec<ConversationTurn>>>,
}

impl InMemoryConversationMemory {
    /// Creates an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn append(
        &self,
        session_id: &str,
        input: &str,
        output: &str,
    ) -> Result<(), MemoryError> {
        self.turns
            .write()
            .entry(session_id.to_owned())
            .or_default()
            .push(ConversationTurn {
                input: input.to_owned(),
                output: output.to_owned(),
                at: Utc::now(),
            });
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>, MemoryError> {
        Ok(self
            .turns
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
