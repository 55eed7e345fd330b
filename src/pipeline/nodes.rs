//! Nodes of the incident-response pipeline.
//!
//! Each node wraps the collaborator(s) it needs and follows the same
//! discipline: collaborator failures become error events plus status
//! fields in state (`Ok`), while malformed input is a node fault
//! (`Err`). Nodes read everything through the snapshot and write
//! everything through the returned partial.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::capabilities::{
    CaseManagement, ContextStore, EndpointIsolation, FirewallControl, IncidentClassifier,
    LogSearch, Severity, TimeRange,
};
use crate::errors::{CauseChain, ErrorEvent};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;

/// The incident text is the first human message of the run.
fn incident_text(snapshot: &StateSnapshot) -> Result<&str, NodeError> {
    snapshot
        .messages
        .iter()
        .find(|m| m.has_role(crate::message::Role::Human))
        .map(|m| m.content.as_str())
        .ok_or(NodeError::MissingInput {
            what: "incident report message",
        })
}

fn capability_failure(name: &'static str, err: &(dyn std::error::Error + 'static)) -> ErrorEvent {
    ErrorEvent::capability(name, CauseChain::from_error(err)).with_tag("collaborator")
}

/// Asks the classification oracle for a severity verdict.
///
/// On oracle failure the node leaves `severity` unset; the router
/// treats that as the cautious investigate path.
pub struct ClassifyIncident {
    classifier: Arc<dyn IncidentClassifier>,
}

impl ClassifyIncident {
    pub fn new(classifier: Arc<dyn IncidentClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Node for ClassifyIncident {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let incident = incident_text(&snapshot)?;
        ctx.emit("classify", "requesting severity verdict");

        match self.classifier.classify(incident).await {
            Ok(verdict) => Ok(NodePartial::new()
                .with_messages(vec![
                    Message::ai(format!(
                        "classified as {} severity: {}",
                        verdict.severity, verdict.rationale
                    ))
                    .with_id("classification"),
                ])
                .with_extra_value("severity", json!(verdict.severity.as_str()))
                .with_extra_value("classification_action", json!(verdict.action))
                .with_extra_value("classification_rationale", json!(verdict.rationale))),
            Err(err) => Ok(NodePartial::new()
                .with_messages(vec![Message::ai(
                    "classification unavailable, proceeding with investigation",
                )])
                .with_errors(vec![capability_failure("classifier", &err)])),
        }
    }
}

/// Queries the log platform for activity related to the incident.
pub struct SearchLogs {
    log_search: Arc<dyn LogSearch>,
}

impl SearchLogs {
    pub fn new(log_search: Arc<dyn LogSearch>) -> Self {
        Self { log_search }
    }
}

#[async_trait]
impl Node for SearchLogs {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let query = match (snapshot.extra_str("source_ip"), snapshot.extra_str("host")) {
            (Some(ip), _) => format!("src_ip={ip}"),
            (None, Some(host)) => format!("host={host}"),
            (None, None) => "index=security earliest=-24h".to_string(),
        };
        ctx.emit("search_logs", format!("query: {query}"));

        match self.log_search.search(&query, TimeRange::default()).await {
            Ok(results) => Ok(NodePartial::new()
                .with_messages(vec![Message::tool(
                    "log_search",
                    format!("{} events matched {:?}", results.count(), results.query),
                )])
                .with_extra_value("log_hits", json!(results.count()))
                .with_extra_value("log_events", Value::Array(results.events))),
            Err(err) => Ok(NodePartial::new()
                .with_extra_value("log_search_failed", json!(true))
                .with_errors(vec![capability_failure("log_search", &err)])),
        }
    }
}

/// Containment: isolates the affected host and blocks the source IP.
///
/// Skips either action when state names no target for it; a pipeline
/// without a known host still blocks the IP, and vice versa.
pub struct Contain {
    isolation: Arc<dyn EndpointIsolation>,
    firewall: Arc<dyn FirewallControl>,
}

impl Contain {
    pub fn new(isolation: Arc<dyn EndpointIsolation>, firewall: Arc<dyn FirewallControl>) -> Self {
        Self {
            isolation,
            firewall,
        }
    }
}

#[async_trait]
impl Node for Contain {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let mut partial = NodePartial::new();
        let mut notes = Vec::new();
        let mut failures = Vec::new();

        if let Some(host) = snapshot.extra_str("host") {
            ctx.emit("contain", format!("isolating host {host}"));
            match self.isolation.isolate(host).await {
                Ok(ticket) => {
                    notes.push(Message::tool(
                        "endpoint_isolation",
                        format!("isolation of {host} acknowledged ({:?})", ticket.status),
                    ));
                    partial = partial
                        .with_extra_value("isolation_status", json!(ticket.status))
                        .with_extra_value("isolation_unlock_code", json!(ticket.unlock_code));
                }
                Err(err) => {
                    partial = partial.with_extra_value("isolation_failed", json!(true));
                    failures.push(capability_failure("endpoint_isolation", &err));
                }
            }
        }

        if let Some(ip) = snapshot.extra_str("source_ip") {
            ctx.emit("contain", format!("blocking source ip {ip}"));
            match self.firewall.block_ip(ip).await {
                Ok(outcome) => {
                    notes.push(Message::tool(
                        "firewall",
                        format!("blocked {} under rule {}", outcome.blocked_ip, outcome.rule_id),
                    ));
                    partial = partial.with_extra_value("firewall_rule_id", json!(outcome.rule_id));
                }
                Err(err) => {
                    partial = partial.with_extra_value("firewall_failed", json!(true));
                    failures.push(capability_failure("firewall", &err));
                }
            }
        }

        if !notes.is_empty() {
            partial = partial.with_messages(notes);
        }
        if !failures.is_empty() {
            partial = partial.with_errors(failures);
        }
        Ok(partial)
    }
}

/// Hands the incident to a human analyst.
///
/// Pure marker node: records the handoff so the case and the saved
/// context show the pipeline did not act autonomously.
pub struct EscalateToAnalyst;

#[async_trait]
impl Node for EscalateToAnalyst {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        ctx.emit("escalate", "paging on-call analyst");
        Ok(NodePartial::new()
            .with_messages(vec![Message::ai(
                "escalated to on-call analyst for manual response",
            )])
            .with_extra_value("escalated", json!(true)))
    }
}

/// Opens a tracking case for the incident.
pub struct OpenCase {
    cases: Arc<dyn CaseManagement>,
}

impl OpenCase {
    pub fn new(cases: Arc<dyn CaseManagement>) -> Self {
        Self { cases }
    }
}

#[async_trait]
impl Node for OpenCase {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let incident = incident_text(&snapshot)?;
        let severity = snapshot
            .extra_str("severity")
            .and_then(|s| s.parse::<Severity>().ok())
            .unwrap_or(Severity::Medium);
        let summary: String = incident.chars().take(120).collect();
        ctx.emit("open_case", format!("creating {severity} case"));

        match self.cases.create_case(&summary, severity).await {
            Ok(case) => Ok(NodePartial::new()
                .with_messages(vec![Message::tool(
                    "case_management",
                    format!("opened case {}", case.id),
                )])
                .with_extra_value("case_id", json!(case.id))),
            Err(err) => Ok(NodePartial::new()
                .with_extra_value("case_failed", json!(true))
                .with_errors(vec![capability_failure("case_management", &err)])),
        }
    }
}

/// Persists the run's findings to the context store.
pub struct SaveContext {
    context: Arc<dyn ContextStore>,
}

impl SaveContext {
    pub fn new(context: Arc<dyn ContextStore>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Node for SaveContext {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let record = json!({
            "fields": snapshot.extra,
            "transcript_len": snapshot.messages.len(),
            "error_count": snapshot.errors.len(),
        });
        ctx.emit("save_context", "persisting investigation context");

        match self.context.save(record).await {
            Ok(()) => Ok(NodePartial::new()
                .with_messages(vec![Message::tool("context_store", "context saved")])
                .with_extra_value("context_saved", json!(true))),
            Err(err) => Ok(NodePartial::new()
                .with_extra_value("context_saved", json!(false))
                .with_errors(vec![capability_failure("context_store", &err)])),
        }
    }
}
