//! State management for the cordon workflow engine.
//!
//! Workflow state only ever advances by merging node updates through the
//! reducers; nodes themselves see immutable [`StateSnapshot`]s. State is
//! organized into three channels plus a run status marker:
//!
//! - **messages**: the transcript (append, with identity replace)
//! - **extra**: key-value fields shared between nodes (last-write-wins)
//! - **errors**: recorded failures (append-only)
//!
//! # Examples
//!
//! ```rust
//! use cordon::state::WorkflowState;
//! use serde_json::json;
//!
//! let state = WorkflowState::builder()
//!     .with_human_message("failed logins from 203.0.113.7")
//!     .with_extra("source_ip", json!("203.0.113.7"))
//!     .build();
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.messages.len(), 1);
//! assert_eq!(snapshot.extra.get("source_ip"), Some(&json!("203.0.113.7")));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::ErrorEvent;
use crate::message::Message;

/// Terminal (and in-flight) status of a workflow run.
///
/// Every run starts `Running` and ends in exactly one of the other
/// three: `Completed` when the terminal marker is reached, `Failed` when
/// a node fault was contained, `Cancelled` when a deadline expired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// True once the run can no longer advance.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The state container a workflow run advances.
///
/// Owned by the executor; node functions never hold a mutable reference.
/// All mutation between steps goes through the reducer registry so the
/// merge rules (append/identity-replace for messages, last-write-wins
/// for extras) hold everywhere.
///
/// # Examples
///
/// ```rust
/// use cordon::state::{RunStatus, WorkflowState};
/// use serde_json::json;
///
/// let mut state = WorkflowState::builder()
///     .with_human_message("phishing report")
///     .build();
/// state.add_extra("severity", json!("medium"));
///
/// assert_eq!(state.status, RunStatus::Running);
/// assert_eq!(state.snapshot().extra["severity"], json!("medium"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Transcript of the run so far.
    pub messages: Vec<Message>,
    /// Shared key-value fields (severity, case ids, tool results).
    pub extra: FxHashMap<String, Value>,
    /// Recorded failures; never cleared, never fatal by themselves.
    pub errors: Vec<ErrorEvent>,
    /// Where the run stands. The executor owns transitions.
    pub status: RunStatus,
}

/// Immutable point-in-time view handed to nodes and routers.
///
/// Snapshots are independent clones: mutating the live state after a
/// snapshot was taken does not affect it, so a node can hold one across
/// an await without races.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub extra: FxHashMap<String, Value>,
    pub errors: Vec<ErrorEvent>,
    pub status: RunStatus,
}

impl StateSnapshot {
    /// Looks up an extra field.
    #[must_use]
    pub fn extra_value(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Looks up an extra field as a string slice.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl WorkflowState {
    /// Creates a state seeded with a single human message.
    ///
    /// This is the common entry for runs started from a raw incident
    /// payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cordon::state::WorkflowState;
    /// use cordon::message::Role;
    ///
    /// let state = WorkflowState::new_with_human_message("malware alert on web-01");
    /// assert_eq!(state.messages.len(), 1);
    /// assert_eq!(state.messages[0].role, Role::Human);
    /// ```
    pub fn new_with_human_message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::human(text)],
            ..Self::default()
        }
    }

    /// Creates a builder for fluent construction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cordon::state::WorkflowState;
    /// use serde_json::json;
    ///
    /// let state = WorkflowState::builder()
    ///     .with_human_message("report")
    ///     .with_system_message("triage run")
    ///     .with_extra("host", json!("web-01"))
    ///     .build();
    /// assert_eq!(state.messages.len(), 2);
    /// ```
    pub fn builder() -> WorkflowStateBuilder {
        WorkflowStateBuilder::default()
    }

    /// Appends a message directly, bypassing the reducers.
    ///
    /// Intended for seeding state before a run; during a run all
    /// message flow goes through `AppendMessages`.
    pub fn add_message(&mut self, message: Message) -> &mut Self {
        self.messages.push(message);
        self
    }

    /// Inserts an extra field directly, bypassing the reducers.
    pub fn add_extra(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Creates an independent snapshot of the current state.
    ///
    /// Clones all channel data, so cost is linear in state size.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.clone(),
            extra: self.extra.clone(),
            errors: self.errors.clone(),
            status: self.status,
        }
    }
}

/// Fluent builder for [`WorkflowState`].
#[derive(Debug, Default)]
pub struct WorkflowStateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl WorkflowStateBuilder {
    /// Adds a human message (incident payload, analyst input).
    #[must_use]
    pub fn with_human_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::human(content));
        self
    }

    /// Adds a system message.
    #[must_use]
    pub fn with_system_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds an arbitrary prebuilt message.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Seeds an extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Builds the state, status `Running`, no errors.
    #[must_use]
    pub fn build(self) -> WorkflowState {
        WorkflowState {
            messages: self.messages,
            extra: self.extra,
            errors: Vec::new(),
            status: RunStatus::Running,
        }
    }
}
