//! The shipped incident-response pipeline.
//!
//! Wires the engine and the collaborator seams into the standard
//! triage graph:
//!
//! ```text
//!                    ┌── "escalate" ──► escalate ──────┐
//! classify ── route ─┤                                 ▼
//!                    └── "investigate" ► search_logs ► ...
//!                        search_logs ► contain ► open_case ► save_context ► End
//!                        escalate ───────────────► open_case
//! ```
//!
//! Critical and High severity skip automated investigation and go
//! straight to a human; everything else is investigated and contained
//! automatically. Both paths end in a tracked case and saved context.

mod nodes;

pub use nodes::{
    ClassifyIncident, Contain, EscalateToAnalyst, OpenCase, SaveContext, SearchLogs,
};

use std::sync::Arc;

use crate::capabilities::Collaborators;
use crate::graphs::{GraphBuilder, GraphConfigError, Router};
use crate::types::NodeKind;
use crate::workflow::{RuntimeConfig, Workflow};

/// Routing labels returned by [`severity_router`].
pub const ROUTE_ESCALATE: &str = "escalate";
pub const ROUTE_INVESTIGATE: &str = "investigate";

/// Routes on the merged severity verdict.
///
/// Critical and High escalate; everything else — including a missing
/// or unparseable verdict — takes the investigate path.
#[must_use]
pub fn severity_router() -> Router {
    Arc::new(|snapshot| {
        match snapshot.extra_str("severity") {
            Some("critical") | Some("high") => ROUTE_ESCALATE.to_string(),
            _ => ROUTE_INVESTIGATE.to_string(),
        }
    })
}

/// Builds the standard incident-response workflow over the given
/// collaborator bundle.
pub fn build_pipeline(
    collaborators: &Collaborators,
    config: RuntimeConfig,
) -> Result<Workflow, GraphConfigError> {
    GraphBuilder::new()
        .add_node(
            "classify",
            ClassifyIncident::new(collaborators.classifier.clone()),
        )
        .add_node(
            "search_logs",
            SearchLogs::new(collaborators.log_search.clone()),
        )
        .add_node(
            "contain",
            Contain::new(
                collaborators.isolation.clone(),
                collaborators.firewall.clone(),
            ),
        )
        .add_node("escalate", EscalateToAnalyst)
        .add_node("open_case", OpenCase::new(collaborators.cases.clone()))
        .add_node(
            "save_context",
            SaveContext::new(collaborators.context.clone()),
        )
        .set_entry_point("classify")
        .add_conditional_edges(
            "classify",
            severity_router(),
            [
                (ROUTE_ESCALATE, NodeKind::from("escalate")),
                (ROUTE_INVESTIGATE, NodeKind::from("search_logs")),
            ],
        )
        .add_edge("search_logs", "contain")
        .add_edge("contain", "open_case")
        .add_edge("escalate", "open_case")
        .add_edge("open_case", "save_context")
        .add_edge("save_context", "End")
        .with_runtime_config(config)
        .compile()
}
