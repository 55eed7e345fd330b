use super::{Reducer, ReducerError};
use crate::node::NodePartial;
use crate::state::WorkflowState;

/// Shallow last-write-wins merge into the extra channel.
///
/// `Value::Null` entries are skipped: an absent or unset field never
/// erases data an earlier node produced. Nodes that genuinely need to
/// clear a field write a sentinel their consumers understand.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn apply(&self, state: &mut WorkflowState, update: &NodePartial) -> Result<(), ReducerError> {
        if let Some(extras_update) = &update.extra
            && !extras_update.is_empty()
        {
            for (k, v) in extras_update.iter() {
                if v.is_null() {
                    continue;
                }
                state.extra.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}
