//! Chat model boundary for prompt-driven text generation.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

/// Narrow interface to a conversational language model.
///
/// Nodes render a prompt, call [`generate`](Self::generate), and interpret
/// the returned text; everything provider-specific (API clients, auth,
/// model selection) lives behind this trait. Implementations should be
/// cheap to clone behind an `Arc` and safe to share across runs.
///
/// # Examples
///
/// ```rust
/// use supportflow::collaborators::{ChatError, ChatModel};
/// use async_trait::async_trait;
///
/// /// Deterministic stand-in used in tests and demos.
/// struct CannedChat(String);
///
/// #[async_trait]
/// impl ChatModel for CannedChat {
///     async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Failures surfaced by a [`ChatModel`].
///
/// Transient variants are fair game for the retry adapter; permanent ones
/// are surfaced to the node immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ChatError {
    /// The call exceeded its bounded timeout.
    #[error("chat request timed out after {waited_ms} ms")]
    #[diagnostic(
        code(supportflow::collaborators::chat_timeout),
        help("Transient: the retry adapter backs off and re-issues the request.")
    )]
    Timeout { waited_ms: u64 },

    /// The provider rejected the call for quota or rate reasons.
    #[error("chat provider rate limited the request")]
    #[diagnostic(
        code(supportflow::collaborators::chat_rate_limited),
        help("Transient: the retry adapter backs off and re-issues the request.")
    )]
    RateLimited,

    /// The provider failed in a way that will not succeed on retry.
    #[error("chat provider rejected the request: {message}")]
    #[diagnostic(code(supportflow::collaborators::chat_provider))]
    Provider { message: String },

    /// The provider answered, but with output the caller cannot use.
    #[error("chat provider returned an unusable reply: {message}")]
    #[diagnostic(code(supportflow::collaborators::chat_malformed))]
    Malformed { message: String },
}

impl ChatError {
    /// Whether a retry with backoff has a chance of succeeding.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Timeout { .. } | ChatError::RateLimited)
    }
}
