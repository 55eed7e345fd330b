use super::{Reducer, ReducerError};
use crate::node::NodePartial;
use crate::state::WorkflowState;

/// Append-only merge into the error channel.
///
/// Error events are a log, not a set: duplicates are kept and nothing
/// is ever removed.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AppendErrors;

impl Reducer for AppendErrors {
    fn apply(&self, state: &mut WorkflowState, update: &NodePartial) -> Result<(), ReducerError> {
        if let Some(errors) = &update.errors
            && !errors.is_empty()
        {
            state.errors.extend(errors.iter().cloned());
        }
        Ok(())
    }
}
