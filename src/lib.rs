//! # Supportflow: Graph-driven Customer Support Workflows
//!
//! Supportflow runs customer support queries through a validated workflow
//! graph: classify the query, assess its sentiment, route it to exactly one
//! handler, and return the drafted reply together with the triage verdict.
//!
//! ## Core Concepts
//!
//! - **State**: one [`state::SupportState`] per run, patched field by field
//! - **Nodes**: async units of work returning a [`state::StatePatch`] of
//!   only the fields they changed
//! - **Graph**: declarative wiring of nodes, plain edges, and routed branch
//!   points, validated at compile time into an [`app::App`]
//! - **Collaborators**: narrow async interfaces to the chat model, the
//!   embedding backend, similarity search, and conversation memory, so
//!   every external service is swappable in tests
//! - **Runtimes**: session-scoped execution with checkpointing, resume, and
//!   an event bus for observability
//!
//! ## Quick Start
//!
//! ### Building a workflow from scratch
//!
//! Any type implementing [`node::Node`] can be wired into a graph:
//!
//! ```rust
//! use supportflow::graphs::GraphBuilder;
//! use supportflow::node::{Node, NodeContext, NodeError};
//! use supportflow::state::{StatePatch, StateSnapshot, SupportState};
//! use supportflow::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct CannedAnswer;
//!
//! #[async_trait]
//! impl Node for CannedAnswer {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<StatePatch, NodeError> {
//!         Ok(StatePatch::default().with_response("hello from the workflow"))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> miette::Result<()> {
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("answer".into()), CannedAnswer)
//!     .add_edge(NodeKind::Custom("answer".into()), NodeKind::End)
//!     .set_entry(NodeKind::Custom("answer".into()))
//!     .compile()?;
//!
//! let done = app.invoke(SupportState::new("hi")).await?;
//! assert_eq!(done.response.as_deref(), Some("hello from the workflow"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Running the support workflow
//!
//! The [`support`] module ships the full triage-and-respond graph; the
//! session runner adds checkpointing and eventing on top:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use supportflow::collaborators::{InMemoryConversationMemory, VectorIndex};
//! use supportflow::runtimes::{RuntimeConfig, WorkflowRunner, generate_session_id};
//! use supportflow::support::{SupportConfig, build_support_app, seed_package_index};
//! # use async_trait::async_trait;
//! # use supportflow::collaborators::{ChatError, ChatModel, Embedder, EmbeddingError};
//! # struct Chat;
//! # #[async_trait]
//! # impl ChatModel for Chat {
//! #     async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
//! #         Ok("ok".to_string())
//! #     }
//! # }
//! # struct Embed;
//! # #[async_trait]
//! # impl Embedder for Embed {
//! #     async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
//! #         Ok(vec![0.0; 1536])
//! #     }
//! #     fn dimension(&self) -> usize {
//! #         1536
//! #     }
//! # }
//!
//! # #[tokio::main]
//! # async fn main() -> miette::Result<()> {
//! let config = SupportConfig::default();
//!
//! let index = Arc::new(VectorIndex::new(Arc::new(Embed)));
//! seed_package_index(&index, &config.catalog).await?;
//!
//! let app = build_support_app(
//!     Arc::new(Chat),
//!     index,
//!     Arc::new(InMemoryConversationMemory::new()),
//!     config,
//! )?;
//!
//! let runner = WorkflowRunner::new(app, RuntimeConfig::default()).await?;
//! let session = generate_session_id();
//! let reply = runner.run_query(&session, "อินเทอร์เน็ตใช้ไม่ได้").await?;
//! println!("[{:?}/{:?}] {}", reply.category, reply.sentiment, reply.response);
//! runner.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible boundary has its own error enum, all of them
//! [`miette::Diagnostic`]s with stable codes: graph validation problems
//! surface as [`graphs::GraphValidationError`], execution failures as
//! [`app::ExecutorError`] carrying the failing node and the last good
//! state, and runner-level concerns as [`runtimes::RunnerError`].
//!
//! ```rust
//! use supportflow::node::{NodeContext, NodeError};
//!
//! fn example(ctx: &NodeContext) -> Result<(), NodeError> {
//!     ctx.emit("validation", "checking input parameters")?;
//!     Err(NodeError::MissingInput { what: "query" })
//! }
//! ```
//!
//! ## Module Guide
//!
//! - [`state`] - support state, snapshots, and the patch type
//! - [`node`] - the [`Node`](node::Node) trait and execution context
//! - [`graphs`] - workflow definition, validation, and compilation
//! - [`app`] - the compiled workflow and its sequential executor
//! - [`collaborators`] - chat, embedding, retrieval, and memory interfaces
//! - [`support`] - the customer support nodes, router, and prompts
//! - [`runtimes`] - session runner, checkpointing, and persistence
//! - [`event_bus`] - workflow event fan-out to pluggable sinks
//! - [`control`] - cooperative cancellation primitives
//! - [`telemetry`] - tracing subscriber setup

pub mod app;
pub mod collaborators;
pub mod control;
pub mod event_bus;
pub mod graphs;
pub mod node;
pub mod runtimes;
pub mod state;
pub mod support;
pub mod telemetry;
pub mod types;
