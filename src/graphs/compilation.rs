//! Graph compilation and structural validation.
//!
//! Compile-time validation is the engine's safety net: an operator
//! tweaking a response pipeline finds out about a dangling edge or an
//! orphaned node here, not three steps into a live incident.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::instrument;

use crate::types::NodeKind;
use crate::workflow::Workflow;

/// Structural problems in a graph definition.
///
/// Most variants surface from [`GraphBuilder::compile`](super::GraphBuilder::compile);
/// [`DeadEnd`](Self::DeadEnd) surfaces at runtime, when execution sits
/// on a non-terminal node with no outgoing edge (static coverage of
/// conditional routers cannot be proven at compile time).
#[derive(Debug, Error, Diagnostic)]
pub enum GraphConfigError {
    #[error("node {name:?} registered more than once")]
    #[diagnostic(
        code(cordon::graph::duplicate_node),
        help("Node names must be unique; rename one of the registrations.")
    )]
    DuplicateNode { name: String },

    #[error("no entry point declared")]
    #[diagnostic(
        code(cordon::graph::missing_entry_point),
        help("Call set_entry_point with the node that should run first.")
    )]
    MissingEntryPoint,

    #[error("multiple entry points declared: {points:?}")]
    #[diagnostic(
        code(cordon::graph::multiple_entry_points),
        help("A workflow has exactly one entry point; remove the extras.")
    )]
    MultipleEntryPoints { points: Vec<String> },

    #[error("entry point {name:?} is not a declared node")]
    #[diagnostic(code(cordon::graph::unknown_entry_point))]
    UnknownEntryPoint { name: String },

    #[error("edge declared from unknown node {from:?}")]
    #[diagnostic(
        code(cordon::graph::unknown_edge_source),
        help("Every edge source must be registered with add_node before compile.")
    )]
    UnknownEdgeSource { from: String },

    #[error("edge from {from:?} points at unknown node {to:?}")]
    #[diagnostic(
        code(cordon::graph::unknown_edge_target),
        help("Every edge destination must be a declared node or the End terminal.")
    )]
    UnknownEdgeTarget { from: String, to: String },

    #[error("conditional edge from {from:?} maps label {label:?} to unknown node {target:?}")]
    #[diagnostic(code(cordon::graph::unknown_route_target))]
    UnknownRouteTarget {
        from: String,
        label: String,
        target: String,
    },

    #[error("node {node:?} has more than one outgoing edge")]
    #[diagnostic(
        code(cordon::graph::ambiguous_source),
        help("A node routes to exactly one place: one static edge, or one conditional edge group.")
    )]
    AmbiguousSource { node: String },

    #[error("node {node:?} is unreachable from the entry point")]
    #[diagnostic(
        code(cordon::graph::unreachable_node),
        help("Connect the node via a static edge or a conditional label, or remove it.")
    )]
    Unreachable { node: String },

    #[error("node {node:?} has no outgoing edge and is not terminal")]
    #[diagnostic(
        code(cordon::graph::dead_end),
        help("Add an edge from this node, or route it to End.")
    )]
    DeadEnd { node: String },
}

impl super::builder::GraphBuilder {
    /// Compiles the graph into an executable [`Workflow`].
    ///
    /// Validation performed, in order:
    ///
    /// 1. node names are unique
    /// 2. exactly one entry point, naming a declared node
    /// 3. every edge source is declared; every destination is declared
    ///    or the `End` terminal (same for conditional label targets)
    /// 4. no source carries two outgoing routes (two static edges, a
    ///    static plus a conditional, or two conditional groups)
    /// 5. every declared node is reachable from the entry point over
    ///    static edges and declared conditional targets
    ///
    /// Nothing is dropped or deduplicated to make a graph pass; the
    /// offending declaration is reported instead.
    #[instrument(skip(self), fields(nodes = self.nodes.len(), edges = self.edges.len()), err)]
    pub fn compile(self) -> Result<Workflow, GraphConfigError> {
        if let Some(name) = self.duplicate_nodes.first() {
            return Err(GraphConfigError::DuplicateNode { name: name.clone() });
        }

        let entry = match self.entry_points.as_slice() {
            [] => return Err(GraphConfigError::MissingEntryPoint),
            [single] => single.clone(),
            many => {
                return Err(GraphConfigError::MultipleEntryPoints {
                    points: many.to_vec(),
                });
            }
        };
        if !self.nodes.contains_key(&entry) {
            return Err(GraphConfigError::UnknownEntryPoint { name: entry });
        }

        // Edge endpoint checks.
        for (from, targets) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphConfigError::UnknownEdgeSource { from: from.clone() });
            }
            for to in targets {
                if let NodeKind::Custom(name) = to
                    && !self.nodes.contains_key(name)
                {
                    return Err(GraphConfigError::UnknownEdgeTarget {
                        from: from.clone(),
                        to: name.clone(),
                    });
                }
            }
        }
        for edge in &self.conditional_edges {
            if !self.nodes.contains_key(edge.from()) {
                return Err(GraphConfigError::UnknownEdgeSource {
                    from: edge.from().to_string(),
                });
            }
            for (label, target) in edge.targets() {
                if let NodeKind::Custom(name) = target
                    && !self.nodes.contains_key(name)
                {
                    return Err(GraphConfigError::UnknownRouteTarget {
                        from: edge.from().to_string(),
                        label: label.clone(),
                        target: name.clone(),
                    });
                }
            }
        }

        // Ambiguity: each source owns at most one route out.
        let mut conditional_sources: FxHashMap<&str, usize> = FxHashMap::default();
        for edge in &self.conditional_edges {
            *conditional_sources.entry(edge.from()).or_default() += 1;
        }
        for (from, count) in &conditional_sources {
            if *count > 1 || self.edges.contains_key(*from) {
                return Err(GraphConfigError::AmbiguousSource {
                    node: (*from).to_string(),
                });
            }
        }
        for (from, targets) in &self.edges {
            if targets.len() > 1 {
                return Err(GraphConfigError::AmbiguousSource { node: from.clone() });
            }
        }

        // Reachability over static edges plus declared conditional targets.
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue = VecDeque::from([entry.as_str()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let static_targets = self.edges.get(current).into_iter().flatten();
            let conditional_targets = self
                .conditional_edges
                .iter()
                .filter(|e| e.from() == current)
                .flat_map(|e| e.targets().values());
            for target in static_targets.chain(conditional_targets) {
                if let NodeKind::Custom(name) = target {
                    queue.push_back(name.as_str());
                }
            }
        }
        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                return Err(GraphConfigError::Unreachable { node: name.clone() });
            }
        }

        // Flatten static edges: exactly zero or one per source now.
        let static_edges: FxHashMap<String, NodeKind> = self
            .edges
            .into_iter()
            .filter_map(|(from, mut targets)| targets.pop().map(|to| (from, to)))
            .collect();
        let conditional_edges: FxHashMap<String, super::edges::ConditionalEdge> = self
            .conditional_edges
            .into_iter()
            .map(|edge| (edge.from().to_string(), edge))
            .collect();

        Ok(Workflow::from_parts(
            self.nodes,
            static_edges,
            conditional_edges,
            entry,
            self.runtime_config,
        ))
    }
}
