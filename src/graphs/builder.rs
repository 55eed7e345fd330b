//! GraphBuilder implementation for constructing workflow graphs.
//!
//! This module contains the main GraphBuilder type and its fluent API
//! for declaring nodes, edges, conditional routing, and the entry point
//! before compiling to an executable [`Workflow`](crate::workflow::Workflow).

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, Router};
use crate::node::Node;
use crate::types::NodeKind;
use crate::workflow::RuntimeConfig;

/// Builder for constructing workflow graphs with a fluent API.
///
/// Nothing is validated while building; [`compile`](Self::compile)
/// checks the whole graph at once and reports the first configuration
/// error it finds. A compiled [`Workflow`](crate::workflow::Workflow)
/// is immutable — there is no way to add nodes or edges after compile.
///
/// # Required configuration
///
/// Every graph must have:
/// - At least one node registered via [`add_node`](Self::add_node)
/// - Exactly one entry point set via [`set_entry_point`](Self::set_entry_point)
/// - A path from every declared node back to the entry point's
///   reachable set (unreachable nodes are a compile error)
///
/// `NodeKind::End` is a virtual terminal: edges point at it, but it is
/// never registered and never executed.
///
/// # Examples
///
/// ```
/// use cordon::graphs::GraphBuilder;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl cordon::node::Node for MyNode {
/// #     async fn run(&self, _: cordon::state::StateSnapshot, _: cordon::node::NodeContext) -> Result<cordon::node::NodePartial, cordon::node::NodeError> {
/// #         Ok(cordon::node::NodePartial::default())
/// #     }
/// # }
/// let workflow = GraphBuilder::new()
///     .add_node("triage", MyNode)
///     .add_node("report", MyNode)
///     .set_entry_point("triage")
///     .add_edge("triage", "report")
///     .add_edge("report", "End")
///     .compile()
///     .expect("valid graph");
/// ```
pub struct GraphBuilder {
    /// Registry of all nodes, keyed by name.
    pub(crate) nodes: FxHashMap<String, Arc<dyn Node>>,
    /// Names registered more than once; rejected at compile.
    pub(crate) duplicate_nodes: Vec<String>,
    /// Unconditional edges. Compile rejects sources with more than one.
    pub(crate) edges: FxHashMap<String, Vec<NodeKind>>,
    /// Conditional edges for state-driven routing.
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    /// Declared entry points; compile requires exactly one.
    pub(crate) entry_points: Vec<String>,
    /// Runtime configuration for the compiled workflow.
    pub(crate) runtime_config: RuntimeConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            duplicate_nodes: Vec::new(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            entry_points: Vec::new(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Registers a node under a unique name.
    ///
    /// Registering the same name twice is recorded and rejected at
    /// compile; nothing is silently replaced.
    #[must_use]
    pub fn add_node(mut self, name: impl Into<String>, node: impl Node + 'static) -> Self {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            self.duplicate_nodes.push(name);
        } else {
            self.nodes.insert(name, Arc::new(node));
        }
        self
    }

    /// Adds an unconditional edge.
    ///
    /// `to` accepts a node name or `"End"` for the terminal marker. A
    /// source may carry at most one unconditional edge; a second one is
    /// an ambiguity error at compile, never a silent merge.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<NodeKind>) -> Self {
        self.edges.entry(from.into()).or_default().push(to.into());
        self
    }

    /// Adds a conditional edge: a routing function plus the full map of
    /// labels it may return and where each label leads.
    ///
    /// # Examples
    ///
    /// ```
    /// use cordon::graphs::{GraphBuilder, Router};
    /// use cordon::types::NodeKind;
    /// use std::sync::Arc;
    ///
    /// # struct MyNode;
    /// # #[async_trait::async_trait]
    /// # impl cordon::node::Node for MyNode {
    /// #     async fn run(&self, _: cordon::state::StateSnapshot, _: cordon::node::NodeContext) -> Result<cordon::node::NodePartial, cordon::node::NodeError> {
    /// #         Ok(cordon::node::NodePartial::default())
    /// #     }
    /// # }
    /// let by_severity: Router = Arc::new(|snapshot| {
    ///     match snapshot.extra_str("severity") {
    ///         Some("critical") | Some("high") => "escalate".to_string(),
    ///         _ => "investigate".to_string(),
    ///     }
    /// });
    ///
    /// let workflow = GraphBuilder::new()
    ///     .add_node("classify", MyNode)
    ///     .add_node("escalate", MyNode)
    ///     .add_node("investigate", MyNode)
    ///     .set_entry_point("classify")
    ///     .add_conditional_edges("classify", by_severity, [
    ///         ("escalate", NodeKind::from("escalate")),
    ///         ("investigate", NodeKind::from("investigate")),
    ///     ])
    ///     .add_edge("escalate", "End")
    ///     .add_edge("investigate", "End")
    ///     .compile()
    ///     .expect("valid graph");
    /// ```
    #[must_use]
    pub fn add_conditional_edges<L, T>(
        mut self,
        from: impl Into<String>,
        router: Router,
        targets: impl IntoIterator<Item = (L, T)>,
    ) -> Self
    where
        L: Into<String>,
        T: Into<NodeKind>,
    {
        self.conditional_edges
            .push(ConditionalEdge::new(from, router, targets));
        self
    }

    /// Declares the entry point: the node that runs first.
    ///
    /// Calling this more than once records every declaration; compile
    /// rejects graphs with zero or several entry points.
    #[must_use]
    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_points.push(name.into());
        self
    }

    /// Overrides the runtime configuration (step budget, deadline) for
    /// the compiled workflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use cordon::graphs::GraphBuilder;
    /// use cordon::workflow::RuntimeConfig;
    /// use std::time::Duration;
    ///
    /// let builder = GraphBuilder::new().with_runtime_config(
    ///     RuntimeConfig::default()
    ///         .with_step_limit(64)
    ///         .with_deadline(Duration::from_secs(30)),
    /// );
    /// ```
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
