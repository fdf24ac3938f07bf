//! Graph definition and compilation for workflow execution.
//!
//! This module provides the workflow graph building blocks: [`GraphBuilder`]
//! collects nodes, edges, and configuration through a fluent API, then
//! compiles them into an executable [`App`](crate::app::App).
//!
//! # Core Concepts
//!
//! - **Nodes**: units of work implementing the [`Node`](crate::node::Node) trait
//! - **Unconditional edges**: a fixed successor per source node
//! - **Conditional edges**: a [`Router`] picks an edge label, the route
//!   table maps it to the next node
//! - **Terminal marker**: `NodeKind::End` is virtual; reaching it (or a
//!   node with no outgoing edge) completes the run
//! - **Compilation**: whole-graph validation up front, so the executor
//!   never hits wiring mistakes mid-run
//!
//! # Quick Start
//!
//! ```rust
//! use supportflow::graphs::GraphBuilder;
//! use supportflow::node::{Node, NodeContext, NodeError};
//! use supportflow::state::{StatePatch, StateSnapshot};
//! use supportflow::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl Node for Greeter {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StatePatch, NodeError> {
//!         Ok(StatePatch::default().with_response("hello"))
//!     }
//! }
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("greet".into()), Greeter)
//!     .set_entry(NodeKind::Custom("greet".into()))
//!     .add_edge(NodeKind::Custom("greet".into()), NodeKind::End)
//!     .compile()
//!     .unwrap();
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphValidationError;
pub use edges::{ConditionalEdge, Router};
