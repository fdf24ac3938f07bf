//! Compiled workflow application and the sequential executor.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::control::CancelToken;
use crate::event_bus::Event;
use crate::graphs::ConditionalEdge;
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{StateError, SupportState};
use crate::types::NodeKind;

/// Executable workflow compiled from a
/// [`GraphBuilder`](crate::graphs::GraphBuilder).
///
/// An `App` owns the validated graph: the node registry, one successor or
/// one router per node, the entry node, and the step ceiling. Execution is
/// strictly sequential: one node runs at a time, its patch is applied
/// atomically, then the next node is chosen. Cloning an `App` is cheap and
/// clones share the underlying nodes.
///
/// # Examples
///
/// ```rust,no_run
/// use supportflow::graphs::GraphBuilder;
/// use supportflow::state::SupportState;
/// use supportflow::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl supportflow::node::Node for MyNode {
/// #     async fn run(&self, _: supportflow::state::StateSnapshot, _: supportflow::node::NodeContext) -> Result<supportflow::state::StatePatch, supportflow::node::NodeError> {
/// #         Ok(supportflow::state::StatePatch::default().with_response("done"))
/// #     }
/// # }
/// #
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("answer".into()), MyNode)
///     .set_entry(NodeKind::Custom("answer".into()))
///     .add_edge(NodeKind::Custom("answer".into()), NodeKind::End)
///     .compile()?;
///
/// let final_state = app.invoke(SupportState::new("hello")).await?;
/// assert_eq!(final_state.response.as_deref(), Some("done"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, NodeKind>,
    conditional_edges: FxHashMap<NodeKind, ConditionalEdge>,
    entry: NodeKind,
    max_steps: u32,
}

/// Per-invocation options for [`App::invoke_with`].
///
/// All options are opt-in: the default runs anonymously (no session),
/// without cancellation, and discards node events.
#[derive(Clone, Debug, Default)]
pub struct InvokeOptions {
    /// Session this run belongs to; threaded into [`NodeContext`] so
    /// session-scoped collaborators know where history lives.
    pub session_id: Option<String>,
    /// Cancellation token observed between and during node invocations.
    pub cancel: Option<CancelToken>,
    /// Destination for node and diagnostic events. Without one, emitted
    /// events are discarded.
    pub event_sender: Option<flume::Sender<Event>>,
}

impl InvokeOptions {
    /// Creates the default option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attaches an event channel sender, usually
    /// [`EventBus::get_sender`](crate::event_bus::EventBus::get_sender).
    #[must_use]
    pub fn with_event_sender(mut self, sender: flume::Sender<Event>) -> Self {
        self.event_sender = Some(sender);
        self
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("conditional_edges", &self.conditional_edges)
            .field("entry", &self.entry)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl App {
    /// Internal (crate) factory to build an App while keeping the graph private.
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, NodeKind>,
        conditional_edges: FxHashMap<NodeKind, ConditionalEdge>,
        entry: NodeKind,
        max_steps: u32,
    ) -> Self {
        App {
            nodes,
            edges,
            conditional_edges,
            entry,
            max_steps,
        }
    }

    /// The node execution starts from.
    #[must_use]
    pub fn entry(&self) -> &NodeKind {
        &self.entry
    }

    /// Hard ceiling on executed steps per run.
    #[must_use]
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// The node registry, keyed by node id.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    /// Unconditional successors, one per source node.
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, NodeKind> {
        &self.edges
    }

    /// Conditional edges, keyed by their source node.
    #[must_use]
    pub fn conditional_edges(&self) -> &FxHashMap<NodeKind, ConditionalEdge> {
        &self.conditional_edges
    }

    /// Runs the workflow to completion with default options.
    ///
    /// Equivalent to [`invoke_with`](Self::invoke_with) with
    /// [`InvokeOptions::default`]: anonymous, not cancellable, events
    /// discarded.
    #[instrument(skip(self, initial), err)]
    pub async fn invoke(&self, initial: SupportState) -> Result<SupportState, ExecutorError> {
        self.invoke_with(initial, InvokeOptions::default()).await
    }

    /// Runs the workflow to completion.
    ///
    /// Starts at the entry node and loops: execute the current node, apply
    /// its patch, pick the successor. The run completes when an edge leads
    /// to `NodeKind::End` or the current node has no outgoing edge.
    ///
    /// # Errors
    ///
    /// - [`ExecutorError::NodeRun`] when a node fails; carries the failing
    ///   node id and the last successfully merged state
    /// - [`ExecutorError::Routing`] when a router returns an unmapped label
    /// - [`ExecutorError::StepCeiling`] when the run exceeds
    ///   [`max_steps`](Self::max_steps)
    /// - [`ExecutorError::Cancelled`] when the token in `options` fires
    ///   before the in-flight node completes; no partial patch is applied
    #[instrument(skip(self, initial, options), fields(session = ?options.session_id), err)]
    pub async fn invoke_with(
        &self,
        initial: SupportState,
        options: InvokeOptions,
    ) -> Result<SupportState, ExecutorError> {
        let mut state = initial;
        let mut current = self.entry.clone();
        let mut step: u32 = 0;
        loop {
            step += 1;
            if step > self.max_steps {
                return Err(ExecutorError::StepCeiling {
                    limit: self.max_steps,
                });
            }
            match self.step(&mut state, &current, step, &options).await? {
                Some(next) => current = next,
                None => {
                    tracing::debug!(steps = step, "workflow run complete");
                    return Ok(state);
                }
            }
        }
    }

    /// Executes one node and applies its patch, returning the next node.
    ///
    /// `Ok(None)` means the run is complete: the node's edge led to
    /// `NodeKind::End`, or it had no outgoing edge. Routers are evaluated
    /// against the post-patch state.
    ///
    /// This is the single-step primitive behind [`invoke_with`]; the
    /// session runner drives it directly so it can checkpoint between
    /// steps.
    ///
    /// [`invoke_with`]: Self::invoke_with
    #[instrument(skip(self, state, options), fields(node = %current), err)]
    pub async fn step(
        &self,
        state: &mut SupportState,
        current: &NodeKind,
        step: u32,
        options: &InvokeOptions,
    ) -> Result<Option<NodeKind>, ExecutorError> {
        if options
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
        {
            return Err(ExecutorError::Cancelled {
                node: current.encode(),
            });
        }

        let node = self
            .nodes
            .get(current)
            .ok_or_else(|| ExecutorError::UnknownNode {
                node: current.encode(),
            })?;

        // Keeps NodeContext::emit working without an attached bus; events
        // sent here are dropped when the step returns.
        let fallback_events;
        let event_bus_sender = match &options.event_sender {
            Some(sender) => sender.clone(),
            None => {
                fallback_events = flume::unbounded();
                fallback_events.0.clone()
            }
        };

        let ctx = NodeContext {
            node_id: current.encode(),
            step,
            session_id: options.session_id.clone(),
            event_bus_sender,
        };

        let outcome = match options.cancel.clone() {
            Some(mut token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        return Err(ExecutorError::Cancelled {
                            node: current.encode(),
                        });
                    }
                    outcome = node.run(state.snapshot(), ctx) => outcome,
                }
            }
            None => node.run(state.snapshot(), ctx).await,
        };

        let patch = outcome.map_err(|source| ExecutorError::NodeRun {
            node: current.encode(),
            step,
            last_state: Box::new(state.clone()),
            source,
        })?;
        state.apply(patch)?;

        if let Some(next) = self.edges.get(current) {
            return Ok(if next.is_end() {
                None
            } else {
                Some(next.clone())
            });
        }
        if let Some(edge) = self.conditional_edges.get(current) {
            let label = edge.evaluate(&state.snapshot());
            return match edge.resolve(&label) {
                Some(next) if next.is_end() => Ok(None),
                Some(next) => Ok(Some(next.clone())),
                None => Err(ExecutorError::Routing {
                    node: current.encode(),
                    label,
                }),
            };
        }
        // No outgoing edge: the node is terminal by construction.
        Ok(None)
    }
}

/// Errors surfaced while executing a compiled workflow.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutorError {
    /// Execution was asked to run a node that is not in the registry.
    #[error("no node registered as {node}")]
    #[diagnostic(
        code(supportflow::app::unknown_node),
        help("Compiled graphs only reference registered nodes; check custom step drivers.")
    )]
    UnknownNode { node: String },

    /// A node failed; no patch was applied for the failing step.
    #[error("node {node} failed at step {step}")]
    #[diagnostic(
        code(supportflow::app::node_run),
        help("The attached state is the last successfully merged value, usable for resume.")
    )]
    NodeRun {
        node: String,
        step: u32,
        /// State as of the last successful merge, before the failing node.
        last_state: Box<SupportState>,
        #[source]
        source: NodeError,
    },

    /// A router returned a label with no mapping in its route table.
    #[error("router at {node} returned unmapped label {label:?}")]
    #[diagnostic(
        code(supportflow::app::routing),
        help("Every label a router can return must be wired in add_conditional_edges; there is no default route.")
    )]
    Routing { node: String, label: String },

    /// The run executed more steps than the configured ceiling.
    #[error("run exceeded the step ceiling of {limit}")]
    #[diagnostic(
        code(supportflow::app::step_ceiling),
        help("A healthy workflow finishes well under the ceiling; look for a routing cycle.")
    )]
    StepCeiling { limit: u32 },

    /// The run was cancelled while a node was in flight.
    #[error("run cancelled while executing node {node}")]
    #[diagnostic(
        code(supportflow::app::cancelled),
        help("No partial patch was applied; state remains at its last merged value.")
    )]
    Cancelled { node: String },

    /// A node's patch violated the state's set-once rules.
    #[error("patch rejected: {0}")]
    #[diagnostic(code(supportflow::app::patch))]
    Patch(#[from] StateError),
}
