use rustc_hash::FxHashMap;

use super::{Reducer, ReducerError};
use crate::node::NodePartial;
use crate::state::WorkflowState;

/// Appends incoming messages to the transcript, replacing in place when
/// an incoming message carries an id the transcript already holds.
///
/// Messages without ids always append. Replacement keeps the original
/// position, so re-emitting a message under the same id revises it
/// rather than duplicating it. Identity resolution runs left to right
/// within an update, which keeps the merge associative: applying two
/// updates in sequence equals applying their concatenation once.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AppendMessages;

impl Reducer for AppendMessages {
    fn apply(&self, state: &mut WorkflowState, update: &NodePartial) -> Result<(), ReducerError> {
        let Some(incoming) = &update.messages else {
            return Ok(());
        };
        if incoming.is_empty() {
            return Ok(());
        }

        // Index existing ids once per apply; updates can carry several
        // revisions of the same message.
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for (i, msg) in state.messages.iter().enumerate() {
            if let Some(id) = &msg.id {
                index.insert(id.clone(), i);
            }
        }

        for msg in incoming {
            let existing = msg.id.as_ref().and_then(|id| index.get(id).copied());
            match existing {
                Some(pos) => {
                    state.messages[pos] = msg.clone();
                }
                None => {
                    state.messages.push(msg.clone());
                    if let Some(id) = &msg.id {
                        index.insert(id.clone(), state.messages.len() - 1);
                    }
                }
            }
        }
        Ok(())
    }
}
