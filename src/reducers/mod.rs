//! Reducers: the only way workflow state advances.
//!
//! Each state channel has a reducer with fixed merge semantics:
//!
//! - messages: append, replacing in place when an incoming message
//!   carries an id already present ([`AppendMessages`])
//! - extra: shallow last-write-wins map merge, nulls skipped ([`MapMerge`])
//! - errors: append-only ([`AppendErrors`])
//!
//! The [`ReducerRegistry`] dispatches a [`NodePartial`] to the reducers
//! for each channel that actually has data.

mod add_errors;
mod add_messages;
mod map_merge;
mod reducer_registry;

pub use add_errors::AppendErrors;
pub use add_messages::AppendMessages;
pub use map_merge::MapMerge;
pub use reducer_registry::ReducerRegistry;

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodePartial;
use crate::state::WorkflowState;
use crate::types::ChannelType;

/// A reducer merges one channel's section of a partial update into state.
///
/// Reducers must be associative over update sequences: applying updates
/// one at a time must equal applying their concatenation. That property
/// is what makes streamed and batched runs converge on the same state.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut WorkflowState, update: &NodePartial) -> Result<(), ReducerError>;
}

/// Merge failures.
///
/// These are fatal to the run: a state that silently dropped part of an
/// update would be worse than no state at all.
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    /// No reducer registered for a channel that carried data.
    #[error("no reducer registered for channel: {0}")]
    #[diagnostic(
        code(cordon::reducers::unknown_channel),
        help("Register a reducer for this channel or drop the data from the update.")
    )]
    UnknownChannel(ChannelType),

    /// An update section did not have the shape its channel requires.
    #[error("update shape invalid for {channel} channel: {reason}")]
    #[diagnostic(
        code(cordon::reducers::shape),
        help("messages must be an array of message objects, errors an array of error events")
    )]
    Shape { channel: ChannelType, reason: String },
}
