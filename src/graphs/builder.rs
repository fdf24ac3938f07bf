//! GraphBuilder implementation for constructing workflow graphs.
//!
//! This module contains the main GraphBuilder type and its fluent API
//! for registering nodes, wiring edges, and configuring execution limits
//! before compiling to an executable [`App`](crate::app::App).

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, Router};
use crate::node::Node;
use crate::types::NodeKind;

/// Builder for constructing workflow graphs with a fluent API.
///
/// `GraphBuilder` collects nodes, edges, and configuration, then
/// [`compile`](Self::compile)s them into an executable
/// [`App`](crate::app::App). Compilation validates the graph as a whole;
/// the builder itself accepts wiring in any order.
///
/// # Required Configuration
///
/// Every graph must have:
/// - At least one executable node added via [`add_node`](Self::add_node)
/// - An entry node set via [`set_entry`](Self::set_entry)
/// - Edges whose targets are registered nodes or `NodeKind::End`
///
/// `NodeKind::End` is a virtual terminal marker: it is never registered
/// with `add_node` and never executed. Reaching it completes the run, as
/// does leaving a node with no outgoing edge.
///
/// # Examples
///
/// ```rust
/// use supportflow::graphs::GraphBuilder;
/// use supportflow::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl supportflow::node::Node for MyNode {
/// #     async fn run(&self, _: supportflow::state::StateSnapshot, _: supportflow::node::NodeContext) -> Result<supportflow::state::StatePatch, supportflow::node::NodeError> {
/// #         Ok(supportflow::state::StatePatch::default())
/// #     }
/// # }
///
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("worker".into()), MyNode)
///     .set_entry(NodeKind::Custom("worker".into()))
///     .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
///
/// ## Conditional Routing
///
/// ```rust
/// use supportflow::graphs::{GraphBuilder, Router};
/// use supportflow::types::NodeKind;
/// use std::sync::Arc;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl supportflow::node::Node for MyNode {
/// #     async fn run(&self, _: supportflow::state::StateSnapshot, _: supportflow::node::NodeContext) -> Result<supportflow::state::StatePatch, supportflow::node::NodeError> {
/// #         Ok(supportflow::state::StatePatch::default())
/// #     }
/// # }
///
/// let by_tone: Router = Arc::new(|snapshot| {
///     if snapshot.sentiment.is_some_and(|s| s.is_negative()) {
///         "escalate".to_string()
///     } else {
///         "answer".to_string()
///     }
/// });
///
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("triage".into()), MyNode)
///     .add_node(NodeKind::Custom("escalate".into()), MyNode)
///     .add_node(NodeKind::Custom("answer".into()), MyNode)
///     .set_entry(NodeKind::Custom("triage".into()))
///     .add_conditional_edges(
///         NodeKind::Custom("triage".into()),
///         by_tone,
///         [
///             ("escalate", NodeKind::Custom("escalate".into())),
///             ("answer", NodeKind::Custom("answer".into())),
///         ],
///     )
///     .add_edge(NodeKind::Custom("escalate".into()), NodeKind::End)
///     .add_edge(NodeKind::Custom("answer".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    /// Registry of all nodes in the graph, keyed by their identifier.
    pub(super) nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    /// Node ids registered more than once, in registration order.
    pub(super) duplicate_nodes: Vec<NodeKind>,
    /// Unconditional edges; compilation enforces one successor per source.
    pub(super) edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    /// Conditional edges for router-driven branching.
    pub(super) conditional_edges: Vec<ConditionalEdge>,
    /// The node execution starts from.
    pub(super) entry: Option<NodeKind>,
    /// Hard ceiling on executed steps per run.
    pub(super) max_steps: u32,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Step ceiling applied when [`with_max_steps`](Self::with_max_steps)
    /// is not called. Generous for any intentional support workflow; only
    /// a wiring cycle gets anywhere near it.
    pub const DEFAULT_MAX_STEPS: u32 = 64;

    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            duplicate_nodes: Vec::new(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            entry: None,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }

    /// Adds a node to the graph.
    ///
    /// Each node must have a unique [`NodeKind`] identifier; registering an
    /// id twice keeps the first implementation and fails compilation.
    /// `NodeKind::End` is virtual and cannot be registered; the attempt is
    /// ignored with a warning.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        if id.is_end() {
            tracing::warn!(?id, "ignoring node registration for the virtual End marker");
            return self;
        }
        if self.nodes.contains_key(&id) {
            self.duplicate_nodes.push(id);
            return self;
        }
        self.nodes.insert(id, Arc::new(node));
        self
    }

    /// Adds an unconditional edge between two nodes.
    ///
    /// When the `from` node completes, execution moves to `to`. A source
    /// may have at most one unconditional successor; extra edges from the
    /// same source fail compilation. Use `NodeKind::End` as the target to
    /// mark an exit point.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        if from.is_end() {
            tracing::warn!("ignoring edge out of the virtual End marker");
            return self;
        }
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Adds a conditional edge set with a router and its label route table.
    ///
    /// When the `from` node completes, `router` is evaluated against the
    /// post-patch state and the returned label is looked up in `routes` to
    /// pick the next node. A label missing from `routes` at run time fails
    /// the run; there is no implicit fallback route.
    ///
    /// # Parameters
    ///
    /// - `from`: the source node for the branch point
    /// - `router`: pure function selecting an edge label from state
    /// - `routes`: `label -> target` pairs; targets may be `NodeKind::End`
    #[must_use]
    pub fn add_conditional_edges<L>(
        mut self,
        from: NodeKind,
        router: Router,
        routes: impl IntoIterator<Item = (L, NodeKind)>,
    ) -> Self
    where
        L: Into<String>,
    {
        let routes: FxHashMap<String, NodeKind> = routes
            .into_iter()
            .map(|(label, target)| (label.into(), target))
            .collect();
        self.conditional_edges
            .push(ConditionalEdge::new(from, router, routes));
        self
    }

    /// Sets the node execution starts from.
    ///
    /// Required; compilation fails without an entry. The entry must be a
    /// registered node.
    #[must_use]
    pub fn set_entry(mut self, entry: NodeKind) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Overrides the per-run step ceiling.
    ///
    /// The ceiling guards against wiring mistakes that cycle forever; it
    /// is not a scheduling knob. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }
}
