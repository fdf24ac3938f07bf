//! Edge types and routers for conditional workflow flow.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Routing function for conditional edges.
///
/// A router is a pure function over the post-patch [`StateSnapshot`]: it
/// returns an edge label, and the conditional edge's route table maps that
/// label to the next node. Routers never perform work and never mutate
/// state; a label with no mapping is a run-time routing failure, not a
/// silent fallback.
///
/// # Examples
///
/// ```rust
/// use supportflow::graphs::Router;
/// use std::sync::Arc;
///
/// let by_tone: Router = Arc::new(|snapshot| {
///     if snapshot.sentiment.is_some_and(|s| s.is_negative()) {
///         "escalate".to_string()
///     } else {
///         "continue".to_string()
///     }
/// });
/// ```
pub type Router = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge: one source node, a router, and a label route table.
///
/// When execution leaves the `from` node, the router is evaluated against
/// the post-patch state and its label is looked up in `routes` to pick the
/// next node. Fields are private so edges are always built through
/// [`GraphBuilder::add_conditional_edges`](crate::graphs::GraphBuilder::add_conditional_edges),
/// which validates them at compile time.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    router: Router,
    routes: FxHashMap<String, NodeKind>,
}

impl ConditionalEdge {
    pub(super) fn new(from: NodeKind, router: Router, routes: FxHashMap<String, NodeKind>) -> Self {
        Self {
            from,
            router,
            routes,
        }
    }

    /// The source node of this conditional edge.
    #[must_use]
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The label route table of this conditional edge.
    #[must_use]
    pub fn routes(&self) -> &FxHashMap<String, NodeKind> {
        &self.routes
    }

    /// Evaluates the router against a snapshot, returning the edge label.
    #[must_use]
    pub fn evaluate(&self, snapshot: &StateSnapshot) -> String {
        (self.router)(snapshot)
    }

    /// Looks a label up in the route table.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<&NodeKind> {
        self.routes.get(label)
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
