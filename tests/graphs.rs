//! Structural validation: every wiring mistake the compiler must catch.

mod common;

use std::sync::Arc;

use common::*;
use supportflow::graphs::{GraphBuilder, GraphValidationError, Router};
use supportflow::state::StateSnapshot;
use supportflow::types::NodeKind;

fn any_router() -> Router {
    Arc::new(|_snapshot: &StateSnapshot| "label".to_string())
}

#[test]
fn empty_builder_reports_missing_entry() {
    let err = GraphBuilder::new().compile().unwrap_err();
    assert_eq!(err, GraphValidationError::MissingEntry);
}

#[test]
fn entry_must_be_a_registered_node() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .set_entry(custom("ghost"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::UnknownEntry {
            entry: "Custom:ghost".to_string()
        }
    );
}

#[test]
fn duplicate_registration_fails_compilation() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_node(custom("a"), PatchNode::respond("second"))
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::DuplicateNode {
            node: "Custom:a".to_string()
        }
    );
}

#[test]
fn edge_source_must_be_registered() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_edge(custom("ghost"), custom("a"))
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::UnknownEdgeSource {
            from: "Custom:ghost".to_string()
        }
    );
}

#[test]
fn edge_target_must_be_registered_or_end() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_edge(custom("a"), custom("ghost"))
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::UnknownEdgeTarget {
            from: "Custom:a".to_string(),
            to: "Custom:ghost".to_string()
        }
    );
}

#[test]
fn route_target_must_be_registered_or_end() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_conditional_edges(custom("a"), any_router(), [("label", custom("ghost"))])
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::UnknownRouteTarget {
            from: "Custom:a".to_string(),
            label: "label".to_string(),
            to: "Custom:ghost".to_string()
        }
    );
}

#[test]
fn two_unconditional_edges_from_one_source_conflict() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_node(custom("b"), PatchNode::noop())
        .add_node(custom("c"), PatchNode::noop())
        .add_edge(custom("a"), custom("b"))
        .add_edge(custom("a"), custom("c"))
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::ConflictingEdges {
            from: "Custom:a".to_string()
        }
    );
}

#[test]
fn edge_and_router_from_one_source_conflict() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_node(custom("b"), PatchNode::noop())
        .add_edge(custom("a"), custom("b"))
        .add_conditional_edges(custom("a"), any_router(), [("label", custom("b"))])
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::ConflictingEdges {
            from: "Custom:a".to_string()
        }
    );
}

#[test]
fn router_requires_at_least_one_route() {
    let routes: [(&str, NodeKind); 0] = [];
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_conditional_edges(custom("a"), any_router(), routes)
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::EmptyRoutes {
            from: "Custom:a".to_string()
        }
    );
}

#[test]
fn nodes_unreachable_from_the_entry_fail_compilation() {
    let err = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_node(custom("island"), PatchNode::noop())
        .add_node(custom("atoll"), PatchNode::noop())
        .add_edge(custom("a"), NodeKind::End)
        .set_entry(custom("a"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        GraphValidationError::Unreachable {
            nodes: vec!["Custom:atoll".to_string(), "Custom:island".to_string()]
        }
    );
}

#[test]
fn linear_graph_compiles_with_the_default_ceiling() {
    let app = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_node(custom("b"), PatchNode::respond("done"))
        .add_edge(custom("a"), custom("b"))
        .add_edge(custom("b"), NodeKind::End)
        .set_entry(custom("a"))
        .compile()
        .unwrap();
    assert_eq!(app.entry(), &custom("a"));
    assert_eq!(app.max_steps(), GraphBuilder::DEFAULT_MAX_STEPS);
    assert_eq!(app.max_steps(), 64);
}

#[test]
fn branch_targets_count_as_reachable() {
    let app = GraphBuilder::new()
        .add_node(custom("triage"), PatchNode::noop())
        .add_node(custom("left"), PatchNode::noop())
        .add_node(custom("right"), PatchNode::noop())
        .add_conditional_edges(
            custom("triage"),
            any_router(),
            [("l", custom("left")), ("r", custom("right"))],
        )
        .add_edge(custom("left"), NodeKind::End)
        .add_edge(custom("right"), NodeKind::End)
        .set_entry(custom("triage"))
        .compile()
        .unwrap();
    assert_eq!(app.nodes().len(), 3);
}

#[test]
fn max_steps_override_is_carried_into_the_app() {
    let app = GraphBuilder::new()
        .add_node(custom("a"), PatchNode::noop())
        .add_edge(custom("a"), NodeKind::End)
        .set_entry(custom("a"))
        .with_max_steps(5)
        .compile()
        .unwrap();
    assert_eq!(app.max_steps(), 5);
}
