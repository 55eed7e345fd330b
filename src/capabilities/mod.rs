//! Collaborator capability seams.
//!
//! Every external system the engine touches — log platform, EDR,
//! firewall, case tracker, context store, classification oracle — sits
//! behind one of these async traits. Nodes receive the whole set as an
//! explicit [`Collaborators`] bundle; nothing reaches for a global.
//!
//! Capability calls return `Result<_, CapabilityError>`, but a failed
//! call is usually *expected* operational trouble: the calling node
//! encodes it into state (an error event plus a status field) and the
//! graph routes on it. Only malformed-input style problems justify a
//! node fault.

mod stubs;

pub use stubs::{
    CaseDesk, ContextLedger, FixtureLogSearch, IsolationDesk, KeywordClassifier,
    PerimeterFirewall,
};

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by collaborator implementations.
#[derive(Debug, Error, Diagnostic)]
pub enum CapabilityError {
    /// The collaborator could not be reached or is down.
    #[error("{name} unavailable: {message}")]
    #[diagnostic(code(cordon::capability::unavailable))]
    Unavailable { name: &'static str, message: String },

    /// The collaborator understood the request and refused it.
    #[error("{name} rejected request: {message}")]
    #[diagnostic(code(cordon::capability::rejected))]
    Rejected { name: &'static str, message: String },
}

/// Incident severity, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other:?}")),
        }
    }
}

/// Verdict from the classification oracle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub severity: Severity,
    /// Recommended next step ("escalate" or "investigate").
    pub action: String,
    /// Why the oracle decided this way.
    pub rationale: String,
}

/// Search window for log queries. Defaults to the last 24 hours.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub earliest: String,
    pub latest: String,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            earliest: "-24h".to_string(),
            latest: "now".to_string(),
        }
    }
}

/// Results of a log search. An empty hit list is a result, not an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub events: Vec<Value>,
}

impl SearchResults {
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

/// Lifecycle of an endpoint isolation request.
///
/// Isolation is two-phase on real EDR platforms: the request is
/// acknowledged (`Pending`) before the agent confirms (`Isolated`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationStatus {
    Pending,
    Isolated,
}

/// Acknowledgement of an isolation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationTicket {
    pub host: String,
    pub status: IsolationStatus,
    /// Code an analyst needs to lift the isolation later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_code: Option<String>,
}

/// Acknowledgement of an applied firewall rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub blocked_ip: String,
}

/// Reference to a created incident case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    pub id: String,
}

/// Queries the log platform.
#[async_trait]
pub trait LogSearch: Send + Sync {
    async fn search(&self, query: &str, range: TimeRange)
    -> Result<SearchResults, CapabilityError>;
}

/// Isolates endpoints and reports isolation progress.
#[async_trait]
pub trait EndpointIsolation: Send + Sync {
    async fn isolate(&self, host: &str) -> Result<IsolationTicket, CapabilityError>;
    async fn status(&self, host: &str) -> Result<IsolationStatus, CapabilityError>;
}

/// Manages perimeter firewall rules.
#[async_trait]
pub trait FirewallControl: Send + Sync {
    async fn block_ip(&self, ip: &str) -> Result<RuleOutcome, CapabilityError>;
}

/// Creates cases in the incident tracker.
#[async_trait]
pub trait CaseManagement: Send + Sync {
    async fn create_case(
        &self,
        summary: &str,
        severity: Severity,
    ) -> Result<CaseRef, CapabilityError>;
}

/// Persists investigation context for later review.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn save(&self, context: Value) -> Result<(), CapabilityError>;
}

/// Judges incident severity and recommends a next step.
#[async_trait]
pub trait IncidentClassifier: Send + Sync {
    async fn classify(&self, incident: &str) -> Result<Classification, CapabilityError>;
}

/// The full collaborator bundle a pipeline runs against.
///
/// Passed explicitly into node constructors; swapping one member (a
/// mock classifier in tests, a real EDR client in production) never
/// touches graph wiring.
#[derive(Clone)]
pub struct Collaborators {
    pub log_search: Arc<dyn LogSearch>,
    pub isolation: Arc<dyn EndpointIsolation>,
    pub firewall: Arc<dyn FirewallControl>,
    pub cases: Arc<dyn CaseManagement>,
    pub context: Arc<dyn ContextStore>,
    pub classifier: Arc<dyn IncidentClassifier>,
}

impl Collaborators {
    /// An all-in-memory bundle backed by the stub implementations.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            log_search: Arc::new(FixtureLogSearch::default()),
            isolation: Arc::new(IsolationDesk::default()),
            firewall: Arc::new(PerimeterFirewall::default()),
            cases: Arc::new(CaseDesk::default()),
            context: Arc::new(ContextLedger::default()),
            classifier: Arc::new(KeywordClassifier),
        }
    }
}
