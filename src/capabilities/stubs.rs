//! In-memory collaborator implementations.
//!
//! Deterministic stand-ins for the real platforms, used by the demo
//! binary and the test suites. Each keeps just enough state to behave
//! like its production counterpart: isolation is two-phase, case ids
//! are sequential, saved context is retrievable for assertions.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{
    CapabilityError, CaseManagement, CaseRef, Classification, ContextStore, EndpointIsolation,
    FirewallControl, IncidentClassifier, IsolationStatus, IsolationTicket, LogSearch, RuleOutcome,
    SearchResults, Severity, TimeRange,
};

/// Log search backed by a fixed list of hits.
///
/// Every query returns the same events; an empty fixture returns an
/// empty (successful) result.
#[derive(Debug, Default)]
pub struct FixtureLogSearch {
    hits: Vec<Value>,
}

impl FixtureLogSearch {
    #[must_use]
    pub fn with_hits(hits: Vec<Value>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl LogSearch for FixtureLogSearch {
    async fn search(
        &self,
        query: &str,
        _range: TimeRange,
    ) -> Result<SearchResults, CapabilityError> {
        Ok(SearchResults {
            query: query.to_string(),
            events: self.hits.clone(),
        })
    }
}

/// Two-phase endpoint isolation.
///
/// The first `isolate` call acknowledges with `Pending` and assigns an
/// unlock code; a later `status` check reports `Isolated`, like an EDR
/// agent confirming on its next heartbeat.
#[derive(Debug, Default)]
pub struct IsolationDesk {
    tickets: Mutex<Vec<IsolationTicket>>,
    counter: AtomicU64,
}

#[async_trait]
impl EndpointIsolation for IsolationDesk {
    async fn isolate(&self, host: &str) -> Result<IsolationTicket, CapabilityError> {
        let code = format!("UNLOCK-{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        let ticket = IsolationTicket {
            host: host.to_string(),
            status: IsolationStatus::Pending,
            unlock_code: Some(code),
        };
        self.tickets
            .lock()
            .expect("isolation ticket lock poisoned")
            .push(ticket.clone());
        Ok(ticket)
    }

    async fn status(&self, host: &str) -> Result<IsolationStatus, CapabilityError> {
        let mut tickets = self.tickets.lock().expect("isolation ticket lock poisoned");
        match tickets.iter_mut().find(|t| t.host == host) {
            Some(ticket) => {
                ticket.status = IsolationStatus::Isolated;
                Ok(IsolationStatus::Isolated)
            }
            None => Err(CapabilityError::Rejected {
                name: "endpoint_isolation",
                message: format!("no isolation requested for host {host:?}"),
            }),
        }
    }
}

/// Firewall that records blocked addresses and hands out rule ids.
#[derive(Debug, Default)]
pub struct PerimeterFirewall {
    blocked: Mutex<Vec<String>>,
    counter: AtomicU64,
}

impl PerimeterFirewall {
    /// Addresses blocked so far, in request order.
    #[must_use]
    pub fn blocked(&self) -> Vec<String> {
        self.blocked
            .lock()
            .expect("firewall lock poisoned")
            .clone()
    }
}

#[async_trait]
impl FirewallControl for PerimeterFirewall {
    async fn block_ip(&self, ip: &str) -> Result<RuleOutcome, CapabilityError> {
        self.blocked
            .lock()
            .expect("firewall lock poisoned")
            .push(ip.to_string());
        let rule_id = format!("FW-{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(RuleOutcome {
            rule_id,
            blocked_ip: ip.to_string(),
        })
    }
}

/// Case tracker issuing sequential case ids.
#[derive(Debug, Default)]
pub struct CaseDesk {
    counter: AtomicU64,
    cases: Mutex<Vec<(String, Severity)>>,
}

impl CaseDesk {
    /// Summaries and severities of created cases, in creation order.
    #[must_use]
    pub fn cases(&self) -> Vec<(String, Severity)> {
        self.cases.lock().expect("case lock poisoned").clone()
    }
}

#[async_trait]
impl CaseManagement for CaseDesk {
    async fn create_case(
        &self,
        summary: &str,
        severity: Severity,
    ) -> Result<CaseRef, CapabilityError> {
        self.cases
            .lock()
            .expect("case lock poisoned")
            .push((summary.to_string(), severity));
        let id = format!("CASE-{:04}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(CaseRef { id })
    }
}

/// Context store keeping saved blobs in memory.
#[derive(Debug, Default)]
pub struct ContextLedger {
    saved: Mutex<Vec<Value>>,
}

impl ContextLedger {
    /// Everything saved so far, in save order.
    #[must_use]
    pub fn saved(&self) -> Vec<Value> {
        self.saved.lock().expect("context lock poisoned").clone()
    }
}

#[async_trait]
impl ContextStore for ContextLedger {
    async fn save(&self, context: Value) -> Result<(), CapabilityError> {
        self.saved
            .lock()
            .expect("context lock poisoned")
            .push(context);
        Ok(())
    }
}

/// Deterministic keyword-driven classification oracle.
///
/// Scans the incident text for indicator terms, most severe match
/// wins. Critical and High verdicts recommend escalation, everything
/// else investigation.
#[derive(Debug, Clone, Copy)]
pub struct KeywordClassifier;

const CRITICAL_TERMS: &[&str] = &["ransomware", "exfiltration", "domain admin", "breach"];
const HIGH_TERMS: &[&str] = &["malware", "lateral movement", "privilege escalation", "c2"];
const MEDIUM_TERMS: &[&str] = &["phishing", "suspicious login", "brute force", "port scan"];

fn first_match<'a>(haystack: &str, terms: &[&'a str]) -> Option<&'a str> {
    terms.iter().copied().find(|term| haystack.contains(term))
}

#[async_trait]
impl IncidentClassifier for KeywordClassifier {
    async fn classify(&self, incident: &str) -> Result<Classification, CapabilityError> {
        let text = incident.to_ascii_lowercase();
        let (severity, matched) = if let Some(term) = first_match(&text, CRITICAL_TERMS) {
            (Severity::Critical, Some(term))
        } else if let Some(term) = first_match(&text, HIGH_TERMS) {
            (Severity::High, Some(term))
        } else if let Some(term) = first_match(&text, MEDIUM_TERMS) {
            (Severity::Medium, Some(term))
        } else {
            (Severity::Low, None)
        };

        let action = if severity >= Severity::High {
            "escalate"
        } else {
            "investigate"
        };
        let rationale = match matched {
            Some(term) => format!("matched indicator {term:?}"),
            None => "no known indicators present".to_string(),
        };
        Ok(Classification {
            severity,
            action: action.to_string(),
            rationale,
        })
    }
}
