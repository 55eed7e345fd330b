//! Core identifiers for the cordon workflow engine.
//!
//! This module defines the fundamental types used throughout the system
//! for identifying edge destinations and state channels in workflow
//! graphs. These are the core domain concepts that define what a
//! workflow *is*.
//!
//! # Key Types
//!
//! - [`NodeKind`]: An edge destination — either a declared node or the
//!   terminal marker
//! - [`ChannelType`]: Identifies the state channels that reducers manage
//!
//! # Examples
//!
//! ```rust
//! use cordon::types::{NodeKind, ChannelType};
//!
//! let next = NodeKind::Custom("classify".to_string());
//! let done = NodeKind::End;
//!
//! // String literals coerce where a NodeKind is expected
//! assert_eq!(NodeKind::from("End"), NodeKind::End);
//! assert_eq!(NodeKind::from("triage"), NodeKind::Custom("triage".into()));
//!
//! let msg_channel = ChannelType::Message;
//! println!("Channel: {}", msg_channel);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// An edge destination within a workflow graph.
///
/// Edges point either at a declared node (by name) or at the terminal
/// marker [`End`](Self::End). There is no virtual start node: workflows
/// name their entry point explicitly at build time.
///
/// # Examples
///
/// ```rust
/// use cordon::types::NodeKind;
///
/// let terminal = NodeKind::End;
/// let node = NodeKind::Custom("open_case".to_string());
///
/// assert!(terminal.is_end());
/// assert!(node.is_custom());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Terminal marker that completes a workflow branch.
    ///
    /// The terminal is virtual: it is never implemented and has no
    /// outgoing edges. Reaching it ends the run with a completed status.
    End,

    /// A declared node, identified by its registered name.
    Custom(String),
}

impl NodeKind {
    /// Returns `true` if this is the [`End`](Self::End) terminal marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this names a declared node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// The declared node name, if this is not the terminal marker.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::End => None,
            Self::Custom(name) => Some(name),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Developer experience: allow string literals where a NodeKind is expected.
// "End" and the LangGraph-style "__end__" both name the terminal.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "End" | "__end__" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::from(s.as_str())
    }
}

/// Identifies the state channel a reducer manages.
///
/// Each channel type has its own reducer and update semantics: messages
/// append (with identity replace), extras merge last-write-wins, errors
/// are append-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Conversation and narration messages flowing through the workflow.
    Message,

    /// Error events recorded without halting execution.
    Error,

    /// Key-value scratch space for fields nodes share (severity,
    /// isolation status, case ids, intermediate results).
    Extra,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Error => write!(f, "error"),
            Self::Extra => write!(f, "extra"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_from_str() {
        assert_eq!(NodeKind::from("End"), NodeKind::End);
        assert_eq!(NodeKind::from("__end__"), NodeKind::End);
        assert_eq!(
            NodeKind::from("classify"),
            NodeKind::Custom("classify".to_string())
        );
    }

    #[test]
    fn node_kind_predicates() {
        assert!(NodeKind::End.is_end());
        assert!(!NodeKind::End.is_custom());
        assert_eq!(NodeKind::End.name(), None);

        let node = NodeKind::Custom("triage".to_string());
        assert!(node.is_custom());
        assert_eq!(node.name(), Some("triage"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(NodeKind::End.to_string(), "End");
        assert_eq!(NodeKind::Custom("x".into()).to_string(), "x");
        assert_eq!(ChannelType::Message.to_string(), "message");
        assert_eq!(ChannelType::Error.to_string(), "error");
        assert_eq!(ChannelType::Extra.to_string(), "extra");
    }
}
