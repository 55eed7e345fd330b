use std::sync::Arc;

use cordon::graphs::{GraphBuilder, GraphConfigError, Router};
use cordon::types::NodeKind;
use cordon::workflow::RuntimeConfig;

mod common;
use common::*;

fn always(label: &'static str) -> Router {
    Arc::new(move |_| label.to_string())
}

/********************
 * Entry point rules
 ********************/

#[test]
fn test_compile_rejects_missing_entry_point() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_edge("a", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::MissingEntryPoint));
}

#[test]
fn test_compile_rejects_multiple_entry_points() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("b", NoopNode)
        .set_entry_point("a")
        .set_entry_point("b")
        .add_edge("a", "b")
        .add_edge("b", "End")
        .compile()
        .unwrap_err();
    match err {
        GraphConfigError::MultipleEntryPoints { points } => {
            assert_eq!(points, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected MultipleEntryPoints, got {other:?}"),
    }
}

#[test]
fn test_compile_rejects_unknown_entry_point() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("ghost")
        .add_edge("a", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        GraphConfigError::UnknownEntryPoint { name } if name == "ghost"
    ));
}

/********************
 * Node and edge endpoint rules
 ********************/

#[test]
fn test_compile_rejects_duplicate_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("a", SimpleMessageNode::new("hi"))
        .set_entry_point("a")
        .add_edge("a", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::DuplicateNode { name } if name == "a"));
}

#[test]
fn test_compile_rejects_dangling_edge_source() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "End")
        .add_edge("ghost", "a")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::UnknownEdgeSource { from } if from == "ghost"));
}

#[test]
fn test_compile_rejects_dangling_edge_target() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "ghost")
        .compile()
        .unwrap_err();
    match err {
        GraphConfigError::UnknownEdgeTarget { from, to } => {
            assert_eq!(from, "a");
            assert_eq!(to, "ghost");
        }
        other => panic!("expected UnknownEdgeTarget, got {other:?}"),
    }
}

#[test]
fn test_compile_rejects_unknown_conditional_target() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_conditional_edges("a", always("go"), [("go", NodeKind::from("ghost"))])
        .compile()
        .unwrap_err();
    match err {
        GraphConfigError::UnknownRouteTarget {
            from,
            label,
            target,
        } => {
            assert_eq!(from, "a");
            assert_eq!(label, "go");
            assert_eq!(target, "ghost");
        }
        other => panic!("expected UnknownRouteTarget, got {other:?}"),
    }
}

#[test]
fn test_compile_rejects_conditional_edge_from_unknown_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "End")
        .add_conditional_edges("ghost", always("go"), [("go", NodeKind::End)])
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::UnknownEdgeSource { from } if from == "ghost"));
}

/********************
 * Ambiguity rules
 ********************/

#[test]
fn test_compile_rejects_two_static_edges_from_one_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("b", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "b")
        .add_edge("a", "End")
        .add_edge("b", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::AmbiguousSource { node } if node == "a"));
}

#[test]
fn test_compile_rejects_static_plus_conditional_from_one_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("b", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "b")
        .add_conditional_edges("a", always("go"), [("go", NodeKind::from("b"))])
        .add_edge("b", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::AmbiguousSource { node } if node == "a"));
}

#[test]
fn test_compile_rejects_two_conditional_groups_from_one_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_conditional_edges("a", always("x"), [("x", NodeKind::End)])
        .add_conditional_edges("a", always("y"), [("y", NodeKind::End)])
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::AmbiguousSource { node } if node == "a"));
}

/********************
 * Reachability
 ********************/

#[test]
fn test_compile_rejects_unreachable_node() {
    let err = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("island", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "End")
        .add_edge("island", "End")
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::Unreachable { node } if node == "island"));
}

#[test]
fn test_conditional_targets_count_as_reachable() {
    let workflow = GraphBuilder::new()
        .add_node("a", NoopNode)
        .add_node("b", NoopNode)
        .set_entry_point("a")
        .add_conditional_edges(
            "a",
            always("go"),
            [("go", NodeKind::from("b")), ("stop", NodeKind::End)],
        )
        .add_edge("b", "End")
        .compile();
    assert!(workflow.is_ok());
}

/********************
 * Successful compile
 ********************/

#[test]
fn test_compile_exposes_topology() {
    let workflow = GraphBuilder::new()
        .add_node("triage", NoopNode)
        .add_node("report", NoopNode)
        .set_entry_point("triage")
        .add_edge("triage", "report")
        .add_edge("report", "End")
        .with_runtime_config(RuntimeConfig::default().with_step_limit(8))
        .compile()
        .expect("valid graph");

    assert_eq!(workflow.entry_point(), "triage");
    let mut names: Vec<&str> = workflow.node_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["report", "triage"]);
    assert_eq!(
        workflow.edges().get("triage"),
        Some(&NodeKind::from("report"))
    );
    assert_eq!(workflow.edges().get("report"), Some(&NodeKind::End));
    assert!(workflow.conditional_edges().is_empty());
    assert_eq!(workflow.config().step_limit, 8);
}

#[test]
fn test_end_aliases_accepted_as_edge_target() {
    // Both the canonical "End" and the legacy "__end__" spelling map to
    // the terminal.
    let workflow = GraphBuilder::new()
        .add_node("a", NoopNode)
        .set_entry_point("a")
        .add_edge("a", "__end__")
        .compile()
        .expect("valid graph");
    assert_eq!(workflow.edges().get("a"), Some(&NodeKind::End));
}
