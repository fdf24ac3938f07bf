//! Collaborator boundaries for external services.
//!
//! A workflow node never talks to a provider SDK directly. Every external
//! dependency is narrowed to a small trait owned by this module:
//!
//! - [`ChatModel`]: rendered prompt in, generated text out
//! - [`Embedder`]: text in, fixed-dimension vector out
//! - [`Retriever`]: query in, scored document hits out
//! - [`ConversationMemory`]: ordered per-session conversation turns
//!
//! Production adapters implement these traits over provider clients; tests
//! and demos use scripted implementations. [`RetryPolicy`] and
//! [`RetryingChatModel`] add bounded timeouts and exponential backoff for
//! transient failures, so any error a node observes is already final.
//!
//! Reference backends live here too: [`VectorIndex`] (in-memory cosine
//! similarity over an [`Embedder`]) and [`InMemoryConversationMemory`].

mod chat;
mod embedding;
mod memory;
mod retrieval;
mod retry;

pub use chat::{ChatError, ChatModel};
pub use embedding::{DEFAULT_EMBEDDING_DIMENSION, Embedder, EmbeddingError};
pub use memory::{ConversationMemory, ConversationTurn, InMemoryConversationMemory, MemoryError};
pub use retrieval::{DocumentHit, Retriever, RetrievalError, VectorIndex};
pub use retry::{RetryPolicy, RetryingChatModel, call_with_retry};
