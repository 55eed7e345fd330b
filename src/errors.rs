//! Structured error events recorded into workflow state.
//!
//! Runs do not abort when a node or collaborator misbehaves; the failure
//! is captured as an [`ErrorEvent`] and appended to the state's error
//! channel, where downstream nodes and the final report can see it.
//! Events are plain serializable data so they survive the trip through
//! the state JSON unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an error originated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    /// A node function returned `Err` at the given step.
    Node { node: String, step: u64 },
    /// A collaborator call failed inside a node.
    Capability { name: String },
    /// The run loop itself (budget accounting, merge plumbing).
    Runner,
    /// Anything without a more specific home.
    #[default]
    App,
}

/// A message plus an optional chain of underlying causes.
///
/// Mirrors `std::error::Error::source` chains in a form that serializes:
/// the outermost entry is what went wrong, each `cause` is one level
/// deeper.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CauseChain {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<CauseChain>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl CauseChain {
    /// A chain with just a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            details: Value::Null,
        }
    }

    /// Attach structured details (request ids, offending input, ...).
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Attach an underlying cause one level deeper.
    #[must_use]
    pub fn with_cause(mut self, cause: CauseChain) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build a chain by walking a `std::error::Error` source chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = CauseChain::msg(err.to_string());
        if let Some(source) = err.source() {
            chain.cause = Some(Box::new(CauseChain::from_error(source)));
        }
        chain
    }
}

/// One recorded failure: when, where, and what.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default = "Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    pub error: CauseChain,
    /// Free-form labels for filtering ("contained", "collaborator", ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Arbitrary structured context captured at the failure site.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl ErrorEvent {
    /// An event scoped to a node fault at a given step.
    pub fn node(node: impl Into<String>, step: u64, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                node: node.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: Value::Null,
        }
    }

    /// An event scoped to a failed collaborator call.
    pub fn capability(name: impl Into<String>, error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Capability { name: name.into() },
            error,
            tags: Vec::new(),
            context: Value::Null,
        }
    }

    /// An event scoped to the run loop.
    pub fn runner(error: CauseChain) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner,
            error,
            tags: Vec::new(),
            context: Value::Null,
        }
    }

    /// Adds a filtering tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds structured context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// One-line rendering for logs and the final report.
    #[must_use]
    pub fn summary(&self) -> String {
        let scope = match &self.scope {
            ErrorScope::Node { node, step } => format!("node {node} (step {step})"),
            ErrorScope::Capability { name } => format!("capability {name}"),
            ErrorScope::Runner => "runner".to_string(),
            ErrorScope::App => "app".to_string(),
        };
        let mut line = format!("{scope}: {}", self.error.message);
        let mut cause = self.error.cause.as_deref();
        while let Some(c) = cause {
            line.push_str(&format!("; caused by: {}", c.message));
            cause = c.cause.as_deref();
        }
        line
    }
}
