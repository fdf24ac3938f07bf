/*!
Checkpointer abstraction for durable session state.

A checkpoint is the latest [`SupportState`] for one session, together
with a monotonically increasing version. `save` replaces the previous
checkpoint (last-write-wins) rather than appending history; `load_latest`
on an unknown session returns `None`, which callers treat as "start a
fresh run".

Per-session save serialization is the caller's job: the session runner
holds a per-session lock across a run, so two runs for the same session
never interleave saves. The backends here only guarantee that a single
`save` is atomic.
*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::state::SupportState;

/// The persisted record for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    /// Session this checkpoint belongs to.
    pub session_id: String,
    /// State as of the most recent save.
    pub state: SupportState,
    /// Monotonically increasing save counter, starting at 1.
    pub version: u64,
    /// When the most recent save happened.
    pub updated_at: DateTime<Utc>,
}

/// Errors surfaced by checkpoint backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    /// The storage backend failed.
    #[error("checkpoint backend error: {message}")]
    #[diagnostic(
        code(supportflow::checkpointer::backend),
        help("Check the database URL and that the schema is migrated.")
    )]
    Backend { message: String },

    /// Serialization or another non-backend failure.
    #[error("checkpointer error: {message}")]
    #[diagnostic(code(supportflow::checkpointer::other))]
    Other { message: String },
}

/// Convenience alias used throughout the checkpointer backends.
pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Durable storage boundary for session checkpoints.
///
/// The executor never manages storage directly; the session runner calls
/// `save` after each successfully merged step and `load_latest` before
/// resuming.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Replace the session's checkpoint with `state`, bumping its version.
    async fn save(&self, session_id: &str, state: &SupportState) -> Result<()>;

    /// The session's latest checkpoint, or `None` for a fresh session.
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove the session's checkpoint. Clearing an unknown session is a no-op.
    async fn clear(&self, session_id: &str) -> Result<()>;

    /// Ids of all sessions with a stored checkpoint.
    async fn list_sessions(&self) -> Result<Vec<String>>;
}

/// Which checkpoint backend a runner should use.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckpointerType {
    /// Process-local storage, lost on restart.
    #[default]
    InMemory,
    /// SQLite-backed durable storage.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// Process-local [`Checkpointer`] backed by a hash map.
///
/// The default backend for tests and demos. Versions are tracked per
/// session and survive `save` replacements, so resume behavior matches
/// the durable backends.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    sessions: RwLock<FxHashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointer {
    /// Creates an empty checkpointer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, session_id: &str, state: &SupportState) -> Result<()> {
        let mut sessions = self.sessions.write();
        let version = sessions
            .get(session_id)
            .map(|existing| existing.version + 1)
            .unwrap_or(1);
        sessions.insert(
            session_id.to_owned(),
            Checkpoint {
                session_id: session_id.to_owned(),
                state: state.clone(),
                version,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
