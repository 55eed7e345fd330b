//! Edge types and routing functions for conditional graph flow.
//!
//! Conditional edges pair a pure routing function with a declared
//! label→destination map. The router only ever names a label; which
//! node that label reaches is fixed at build time, so the compiler can
//! validate every possible destination before the first run.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Routing function for conditional edges.
///
/// Takes a [`StateSnapshot`] and returns a label. Routers must be pure:
/// no side effects, no interior mutability — the same snapshot always
/// yields the same label. All state inspection they need is on the
/// snapshot.
///
/// # Examples
///
/// ```
/// use cordon::graphs::Router;
/// use std::sync::Arc;
///
/// let by_severity: Router = Arc::new(|snapshot| {
///     match snapshot.extra_str("severity") {
///         Some("critical") | Some("high") => "escalate".to_string(),
///         _ => "investigate".to_string(),
///     }
/// });
/// ```
pub type Router = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge: routing function plus label→destination map.
///
/// When execution leaves the `from` node, the router is evaluated
/// against the merged state and its label is looked up in `targets`.
/// A label with no mapping is a fatal routing error — the run stops
/// rather than guessing.
///
/// # Examples
///
/// ```
/// use cordon::graphs::{ConditionalEdge, Router};
/// use cordon::types::NodeKind;
/// use std::sync::Arc;
///
/// let router: Router = Arc::new(|snapshot| {
///     if snapshot.extra.contains_key("case_id") { "done".into() } else { "open_case".into() }
/// });
///
/// let edge = ConditionalEdge::new(
///     "review",
///     router,
///     [("open_case", NodeKind::from("open_case")), ("done", NodeKind::End)],
/// );
/// assert_eq!(edge.from(), "review");
/// ```
#[derive(Clone)]
pub struct ConditionalEdge {
    from: String,
    router: Router,
    targets: FxHashMap<String, NodeKind>,
}

impl ConditionalEdge {
    /// Creates a new conditional edge.
    pub fn new<L, T>(
        from: impl Into<String>,
        router: Router,
        targets: impl IntoIterator<Item = (L, T)>,
    ) -> Self
    where
        L: Into<String>,
        T: Into<NodeKind>,
    {
        Self {
            from: from.into(),
            router,
            targets: targets
                .into_iter()
                .map(|(label, target)| (label.into(), target.into()))
                .collect(),
        }
    }

    /// The source node of this conditional edge.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// The routing function.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The declared label→destination map.
    pub fn targets(&self) -> &FxHashMap<String, NodeKind> {
        &self.targets
    }

    /// Resolves a routed label to its destination, if declared.
    pub fn resolve(&self, label: &str) -> Option<&NodeKind> {
        self.targets.get(label)
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}
