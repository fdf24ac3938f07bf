//! Node execution framework for the supportflow workflow engine.
//!
//! This module provides the core abstractions for executable workflow nodes:
//! the [`Node`] trait, the execution context handed to each invocation, and
//! the fatal error taxonomy nodes surface to the executor.

// Standard library and external crates
use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

// Internal crate modules
use crate::collaborators::{ChatError, EmbeddingError, MemoryError, RetrievalError};
use crate::event_bus::Event;
use crate::state::{StatePatch, StateSnapshot};

// ============================================================================
// Core Trait
// ============================================================================

/// Core trait defining executable workflow nodes.
///
/// A node is a single unit of work: it receives a read-only snapshot of the
/// run's state plus an execution context, performs its work (possibly
/// calling an external collaborator), and returns a [`StatePatch`] with
/// only the fields it changed.
///
/// # Design Principles
///
/// - **Stateless**: nodes hold configuration and collaborator handles, not
///   per-run state; the same node instance serves every run.
/// - **Resume-aware**: when the field a node is responsible for is already
///   populated in the snapshot, it returns an empty patch without calling
///   any collaborator, which makes checkpoint replay idempotent.
/// - **Observable**: use [`NodeContext::emit`] to report progress to the
///   event bus.
///
/// # Errors
///
/// A returned [`NodeError`] is fatal for the run: the executor applies no
/// patch and surfaces the failure with this node's id attached. Transient
/// collaborator failures should be retried inside the collaborator adapter
/// before ever reaching this boundary.
///
/// # Examples
///
/// ```rust
/// use supportflow::node::{Node, NodeContext, NodeError};
/// use supportflow::state::{Category, StatePatch, StateSnapshot};
/// use async_trait::async_trait;
///
/// struct FixedCategoryNode;
///
/// #[async_trait]
/// impl Node for FixedCategoryNode {
///     async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<StatePatch, NodeError> {
///         if snapshot.category.is_some() {
///             return Ok(StatePatch::default());
///         }
///         ctx.emit("classify", "assigning fixed category")?;
///         Ok(StatePatch::default().with_category(Category::General))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node with the given state snapshot and context.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError>;
}

// ============================================================================
// Execution Context
// ============================================================================

/// Execution context passed to nodes during workflow execution.
///
/// Carries the node's identity, the current step number, the session this
/// run belongs to (when driven by a session runner), and the event channel
/// for observability. Collaborator handles are not part of the context;
/// they are injected into node structs at construction time.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier of the node being executed.
    pub node_id: String,
    /// Current execution step number, starting at 1.
    pub step: u32,
    /// Session this run belongs to, when one exists.
    ///
    /// `None` for anonymous one-shot invocations; session-scoped
    /// collaborator use (conversation memory) is skipped in that case.
    pub session_id: Option<String>,
    /// Channel for emitting events to the workflow's event bus.
    pub event_bus_sender: flume::Sender<Event>,
}

impl NodeContext {
    /// Emit a node-scoped event enriched with this context's metadata.
    ///
    /// The event carries the node's id and step number, making it traceable
    /// in the run's event stream.
    pub fn emit(&self, scope: impl Into<String>, message: impl Into<String>) -> Result<(), NodeContextError> {
        self.event_bus_sender
            .send(Event::node_message(
                self.node_id.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when using NodeContext methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    /// Event could not be sent because the event bus has shut down.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(supportflow::node::event_bus_unavailable),
        help("The event bus listener may have stopped. Check workflow shutdown order.")
    )]
    EventBusUnavailable,
}

/// Fatal errors surfaced by node execution.
///
/// Collaborator error types convert into `NodeError` via `From`, so node
/// implementations can propagate adapter failures with `?`. By the time a
/// collaborator error reaches this boundary it is final: transient
/// failures were already retried inside the adapter.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(supportflow::node::missing_input),
        help("Check that graph wiring runs the producing node before this one.")
    )]
    MissingInput { what: &'static str },

    /// Chat collaborator failure, after adapter-level retries.
    #[error("chat collaborator failed: {0}")]
    #[diagnostic(code(supportflow::node::chat))]
    Chat(#[from] ChatError),

    /// Embedding collaborator failure, after adapter-level retries.
    #[error("embedding collaborator failed: {0}")]
    #[diagnostic(code(supportflow::node::embedding))]
    Embedding(#[from] EmbeddingError),

    /// Retrieval collaborator failure, after adapter-level retries.
    #[error("retrieval collaborator failed: {0}")]
    #[diagnostic(code(supportflow::node::retrieval))]
    Retrieval(#[from] RetrievalError),

    /// Conversation memory failure.
    #[error("conversation memory failed: {0}")]
    #[diagnostic(code(supportflow::node::memory))]
    Memory(#[from] MemoryError),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(supportflow::node::event_bus))]
    EventBus(#[from] NodeContextError),
}
