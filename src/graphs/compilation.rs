//! Graph compilation and structural validation.
//!
//! Compilation turns a [`GraphBuilder`] into an executable
//! [`App`](crate::app::App), validating the whole graph up front so the
//! executor never discovers wiring mistakes mid-run.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;

use super::builder::GraphBuilder;
use super::edges::ConditionalEdge;
use crate::app::App;
use crate::types::NodeKind;

/// Structural problems found while compiling a graph.
///
/// Compilation stops at the first violation. Checks run in a fixed order
/// (duplicates, entry, unconditional edges, conditional edges, edge
/// conflicts, reachability) and iterate nodes in sorted id order, so the
/// reported error is deterministic for a given graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphValidationError {
    /// A node id was registered more than once.
    #[error("node {node} is registered twice")]
    #[diagnostic(
        code(supportflow::graphs::duplicate_node),
        help("Every node id must be unique. The first registration wins, remove the second.")
    )]
    DuplicateNode { node: String },

    /// No entry node was set.
    #[error("no entry node set")]
    #[diagnostic(
        code(supportflow::graphs::missing_entry),
        help("Call set_entry with the node execution should start from.")
    )]
    MissingEntry,

    /// The entry refers to a node that was never registered.
    #[error("entry node {entry} is not registered")]
    #[diagnostic(
        code(supportflow::graphs::unknown_entry),
        help("The entry must name a node added via add_node.")
    )]
    UnknownEntry { entry: String },

    /// An edge leaves a node that was never registered.
    #[error("edge leaves unregistered node {from}")]
    #[diagnostic(
        code(supportflow::graphs::unknown_edge_source),
        help("Edges may only leave nodes added via add_node.")
    )]
    UnknownEdgeSource { from: String },

    /// An unconditional edge points at a node that was never registered.
    #[error("edge from {from} points at unregistered node {to}")]
    #[diagnostic(
        code(supportflow::graphs::unknown_edge_target),
        help("Edge targets must be registered nodes or the End marker.")
    )]
    UnknownEdgeTarget { from: String, to: String },

    /// A conditional route points at a node that was never registered.
    #[error("route {label:?} from {from} points at unregistered node {to}")]
    #[diagnostic(
        code(supportflow::graphs::unknown_route_target),
        help("Every router label must map to a registered node or the End marker.")
    )]
    UnknownRouteTarget {
        from: String,
        label: String,
        to: String,
    },

    /// A node has more than one outgoing edge set.
    #[error("node {from} has conflicting outgoing edges")]
    #[diagnostic(
        code(supportflow::graphs::conflicting_edges),
        help(
            "A node takes exactly one successor: a single unconditional edge or a single router, never both."
        )
    )]
    ConflictingEdges { from: String },

    /// A conditional edge has an empty route table.
    #[error("conditional edge from {from} has no routes")]
    #[diagnostic(
        code(supportflow::graphs::empty_routes),
        help("A router with nowhere to route is a wiring mistake. Add at least one label mapping.")
    )]
    EmptyRoutes { from: String },

    /// Registered nodes that no path from the entry can reach.
    #[error("nodes unreachable from the entry: {}", .nodes.join(", "))]
    #[diagnostic(
        code(supportflow::graphs::unreachable_nodes),
        help("Dead nodes are wiring mistakes. Connect them or remove them.")
    )]
    Unreachable { nodes: Vec<String> },
}

/// Compilation logic for GraphBuilder.
impl GraphBuilder {
    /// Compiles the graph into an executable application.
    ///
    /// Validates the builder's contents and converts them into an
    /// [`App`]. Validation fails when:
    ///
    /// - a node id was registered twice
    /// - no entry is set, or the entry is not a registered node
    /// - an edge or route references an unregistered node
    /// - a node has more than one outgoing edge set
    /// - a conditional edge has an empty route table
    /// - a registered node is unreachable from the entry
    ///
    /// # Examples
    ///
    /// ```rust
    /// use supportflow::graphs::{GraphBuilder, GraphValidationError};
    ///
    /// let err = GraphBuilder::new().compile().unwrap_err();
    /// assert_eq!(err, GraphValidationError::MissingEntry);
    /// ```
    pub fn compile(self) -> Result<App, GraphValidationError> {
        let GraphBuilder {
            nodes,
            duplicate_nodes,
            edges,
            conditional_edges,
            entry,
            max_steps,
        } = self;

        if let Some(node) = duplicate_nodes.first() {
            return Err(GraphValidationError::DuplicateNode {
                node: node.encode(),
            });
        }

        let entry = entry.ok_or(GraphValidationError::MissingEntry)?;
        if !nodes.contains_key(&entry) {
            return Err(GraphValidationError::UnknownEntry {
                entry: entry.encode(),
            });
        }

        let mut edge_sources: Vec<&NodeKind> = edges.keys().collect();
        edge_sources.sort_by_key(|kind| kind.encode());

        let mut successors: FxHashMap<NodeKind, NodeKind> = FxHashMap::default();
        for from in edge_sources {
            if !nodes.contains_key(from) {
                return Err(GraphValidationError::UnknownEdgeSource {
                    from: from.encode(),
                });
            }
            match edges[from].as_slice() {
                [] => {}
                [to] => {
                    if !to.is_end() && !nodes.contains_key(to) {
                        return Err(GraphValidationError::UnknownEdgeTarget {
                            from: from.encode(),
                            to: to.encode(),
                        });
                    }
                    successors.insert(from.clone(), to.clone());
                }
                [_, _, ..] => {
                    return Err(GraphValidationError::ConflictingEdges {
                        from: from.encode(),
                    });
                }
            }
        }

        for edge in &conditional_edges {
            let from = edge.from();
            if !nodes.contains_key(from) {
                return Err(GraphValidationError::UnknownEdgeSource {
                    from: from.encode(),
                });
            }
            if edge.routes().is_empty() {
                return Err(GraphValidationError::EmptyRoutes {
                    from: from.encode(),
                });
            }
            let mut labels: Vec<&String> = edge.routes().keys().collect();
            labels.sort();
            for label in labels {
                let to = &edge.routes()[label];
                if !to.is_end() && !nodes.contains_key(to) {
                    return Err(GraphValidationError::UnknownRouteTarget {
                        from: from.encode(),
                        label: label.clone(),
                        to: to.encode(),
                    });
                }
            }
        }

        let mut routers: FxHashMap<NodeKind, ConditionalEdge> = FxHashMap::default();
        for edge in conditional_edges {
            let from = edge.from().clone();
            if successors.contains_key(&from) || routers.insert(from.clone(), edge).is_some() {
                return Err(GraphValidationError::ConflictingEdges {
                    from: from.encode(),
                });
            }
        }

        let mut visited: FxHashSet<NodeKind> = FxHashSet::default();
        let mut queue: VecDeque<NodeKind> = VecDeque::new();
        visited.insert(entry.clone());
        queue.push_back(entry.clone());
        while let Some(current) = queue.pop_front() {
            if let Some(next) = successors.get(&current)
                && !next.is_end()
                && visited.insert(next.clone())
            {
                queue.push_back(next.clone());
            }
            if let Some(edge) = routers.get(&current) {
                for target in edge.routes().values() {
                    if !target.is_end() && visited.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        let mut unreachable: Vec<String> = nodes
            .keys()
            .filter(|kind| !visited.contains(*kind))
            .map(|kind| kind.encode())
            .collect();
        if !unreachable.is_empty() {
            unreachable.sort();
            return Err(GraphValidationError::Unreachable {
                nodes: unreachable,
            });
        }

        Ok(App::from_parts(nodes, successors, routers, entry, max_steps))
    }
}
