//! Node execution contract for the cordon workflow engine.
//!
//! This module provides the core abstractions for executable workflow
//! nodes: the [`Node`] trait, execution context, partial state updates,
//! and the node-level error type.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::errors::ErrorEvent;
use crate::message::Message;
use crate::reducers::ReducerError;
use crate::state::StateSnapshot;
use crate::types::ChannelType;

/// Core trait defining executable workflow nodes.
///
/// A node receives an immutable snapshot of the current state plus its
/// execution context, does its work, and returns the partial update it
/// wants merged. Nodes never mutate state directly.
///
/// # Error handling
///
/// Two distinct paths, and picking the right one matters:
/// 1. **Expected operational failures** (a collaborator call errors, a
///    lookup comes back empty): encode them into the returned
///    [`NodePartial`] as data — an [`ErrorEvent`] and/or a status field —
///    and return `Ok`. Downstream nodes route on that data.
/// 2. **Node faults** (malformed input, broken invariants): return
///    `Err(NodeError)`. The executor contains the fault, records it into
///    the state's error channel, and ends the run with a failed status.
///
/// # Examples
///
/// ```rust,no_run
/// use cordon::node::{Node, NodeContext, NodePartial, NodeError};
/// use cordon::state::StateSnapshot;
/// use cordon::message::Message;
/// use async_trait::async_trait;
///
/// struct Triage;
///
/// #[async_trait]
/// impl Node for Triage {
///     async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
///         ctx.emit("triage", "inspecting incident");
///         let report = snapshot
///             .last_message()
///             .ok_or(NodeError::MissingInput { what: "incident report message" })?;
///         Ok(NodePartial::new().with_messages(vec![Message::ai(format!(
///             "triaged: {} bytes of report",
///             report.content.len()
///         ))]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against the given snapshot.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;
}

/// Execution context passed to a node for one step.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// The name this node was registered under.
    pub node: String,
    /// Current step number (1-based, counts completed node runs).
    pub step: u64,
}

impl NodeContext {
    pub(crate) fn new(node: impl Into<String>, step: u64) -> Self {
        Self {
            node: node.into(),
            step,
        }
    }

    /// Emit a node-scoped progress event into the tracing stream.
    ///
    /// Carries the node name and step so runs are reconstructable from
    /// logs alone.
    pub fn emit(&self, scope: &str, message: impl AsRef<str>) {
        tracing::info!(
            target: "cordon::node",
            node = %self.node,
            step = self.step,
            scope,
            "{}",
            message.as_ref()
        );
    }
}

/// Partial state update returned by node execution.
///
/// Every section is optional; a node touches only the channels it cares
/// about and the reducers merge the rest untouched. `None` and an empty
/// section are equivalent: both are no-ops at merge time.
///
/// # Examples
///
/// ```rust
/// use cordon::node::NodePartial;
/// use cordon::message::Message;
/// use rustc_hash::FxHashMap;
/// use serde_json::json;
///
/// let mut extra = FxHashMap::default();
/// extra.insert("severity".to_string(), json!("high"));
///
/// let partial = NodePartial::new()
///     .with_messages(vec![Message::ai("classified as high severity")])
///     .with_extra(extra);
/// ```
#[derive(Clone, Debug, Default)]
pub struct NodePartial {
    /// Messages to merge into the transcript.
    pub messages: Option<Vec<Message>>,
    /// Key-value fields to merge into the extra channel.
    pub extra: Option<FxHashMap<String, Value>>,
    /// Error events to append.
    pub errors: Option<Vec<ErrorEvent>>,
}

impl NodePartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the messages section.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Sets the extra section.
    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Sets the errors section.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Adds a single extra field, keeping any already set.
    #[must_use]
    pub fn with_extra_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra
            .get_or_insert_with(FxHashMap::default)
            .insert(key.into(), value);
        self
    }

    /// True when no section would change anything at merge time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.as_ref().is_none_or(Vec::is_empty)
            && self.extra.as_ref().is_none_or(FxHashMap::is_empty)
            && self.errors.as_ref().is_none_or(Vec::is_empty)
    }

    /// Decodes an untyped JSON object into a partial update.
    ///
    /// Used at boundaries where updates arrive as raw JSON rather than
    /// through the typed builders. A `messages` key must be an array of
    /// message objects and an `errors` key an array of error events;
    /// every other key lands in the extra section as-is. Shape
    /// mismatches fail with [`ReducerError::Shape`].
    pub fn from_json(value: Value) -> Result<Self, ReducerError> {
        let Value::Object(map) = value else {
            return Err(ReducerError::Shape {
                channel: ChannelType::Extra,
                reason: "update must be a JSON object".to_string(),
            });
        };

        let mut partial = NodePartial::new();
        let mut extra = FxHashMap::default();
        for (key, val) in map {
            match key.as_str() {
                "messages" => {
                    let messages: Vec<Message> =
                        serde_json::from_value(val).map_err(|e| ReducerError::Shape {
                            channel: ChannelType::Message,
                            reason: e.to_string(),
                        })?;
                    partial.messages = Some(messages);
                }
                "errors" => {
                    let errors: Vec<ErrorEvent> =
                        serde_json::from_value(val).map_err(|e| ReducerError::Shape {
                            channel: ChannelType::Error,
                            reason: e.to_string(),
                        })?;
                    partial.errors = Some(errors);
                }
                _ => {
                    extra.insert(key, val);
                }
            }
        }
        if !extra.is_empty() {
            partial.extra = Some(extra);
        }
        Ok(partial)
    }
}

/// Fatal node execution errors.
///
/// Returning one of these ends the run with a failed status (contained
/// by the executor, not propagated). For failures downstream nodes
/// should route on, use `NodePartial.errors` instead.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(cordon::node::missing_input),
        help("Check that an upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// A collaborator failed in a way the node cannot encode as data.
    #[error("collaborator error ({name}): {message}")]
    #[diagnostic(code(cordon::node::collaborator))]
    Collaborator { name: &'static str, message: String },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(cordon::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(cordon::node::validation),
        help("Check input data format and required fields.")
    )]
    ValidationFailed(String),
}
