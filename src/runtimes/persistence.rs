/*!
Persistence primitives for serializing/deserializing session state
(used by the SQLite checkpointer and any future persistent backends).

Design Goals:
- Provide explicit serde-friendly structs decoupled from internal
  in-memory representations.
- Keep conversion logic localized (From / TryFrom impls) so the
  checkpointer code is lean and declarative.
- Reject shapes outside the fixed state schema (`deny_unknown_fields`)
  and enum strings outside the known sets, so a corrupted or
  hand-edited checkpoint fails loudly at load time.

This module intentionally does NOT perform I/O. It is pure data
transformation and (de)serialization glue.
*/

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtimes::checkpointer::Checkpoint;
use crate::state::{Category, Sentiment, SupportState};

/// Persisted shape of the in-memory [`SupportState`].
///
/// Enum fields are stored as their canonical strings and validated on
/// conversion back, keeping the stored form stable even if the in-memory
/// enums grow derive attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PersistedState {
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Bidirectional conversion and serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(supportflow::persistence::serde),
        help("Ensure the JSON structure matches the PersistedState shape.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    #[error("persisted category {value:?} is not a known category")]
    #[diagnostic(
        code(supportflow::persistence::unknown_category),
        help("Known categories: Technical, Billing, General, Package.")
    )]
    UnknownCategory { value: String },

    #[error("persisted sentiment {value:?} is not a known sentiment")]
    #[diagnostic(
        code(supportflow::persistence::unknown_sentiment),
        help("Known sentiments: Positive, Neutral, Negative.")
    )]
    UnknownSentiment { value: String },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl PersistedState {
    /// Serializes to the JSON stored in checkpoint backends.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| PersistenceError::Serde { source })
    }

    /// Deserializes from stored checkpoint JSON.
    ///
    /// Fields outside the fixed schema fail deserialization.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
    }
}

/// Full checkpoint record as persisted: session id, state, save counter.
///
/// This is the stable wire layout. Backends that store the record as
/// separate columns (the SQLite checkpointer) reassemble one of these
/// before converting back to a [`Checkpoint`], so decode and validation
/// live in one place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PersistedCheckpoint {
    pub session_id: String,
    pub state: PersistedState,
    pub version: u64,
}

impl PersistedCheckpoint {
    /// Rebuilds the engine-side checkpoint, stamping it with `updated_at`.
    ///
    /// The timestamp is not part of the record layout; backends supply it
    /// from their own bookkeeping.
    pub fn try_into_checkpoint(self, updated_at: DateTime<Utc>) -> Result<Checkpoint> {
        Ok(Checkpoint {
            session_id: self.session_id,
            state: SupportState::try_from(self.state)?,
            version: self.version,
            updated_at,
        })
    }
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(checkpoint: &Checkpoint) -> Self {
        PersistedCheckpoint {
            session_id: checkpoint.session_id.clone(),
            state: PersistedState::from(&checkpoint.state),
            version: checkpoint.version,
        }
    }
}

/* ---------- SupportState <-> PersistedState Conversions ---------- */

impl From<&SupportState> for PersistedState {
    fn from(state: &SupportState) -> Self {
        PersistedState {
            query: state.query.clone(),
            category: state.category.map(|c| c.as_str().to_owned()),
            sentiment: state.sentiment.map(|s| s.as_str().to_owned()),
            context: state.context.clone(),
            response: state.response.clone(),
        }
    }
}

impl TryFrom<PersistedState> for SupportState {
    type Error = PersistenceError;

    fn try_from(p: PersistedState) -> Result<Self> {
        let category = p
            .category
            .map(|value| {
                Category::parse_exact(&value)
                    .ok_or(PersistenceError::UnknownCategory { value })
            })
            .transpose()?;
        let sentiment = p
            .sentiment
            .map(|value| {
                Sentiment::parse_exact(&value)
                    .ok_or(PersistenceError::UnknownSentiment { value })
            })
            .transpose()?;
        Ok(SupportState {
            query: p.query,
            category,
            sentiment,
            context: p.context,
            response: p.response,
        })
    }
}
