use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    node::NodePartial,
    reducers::{AppendErrors, AppendMessages, MapMerge, Reducer, ReducerError},
    state::WorkflowState,
    types::ChannelType,
};

/// Dispatches partial updates to the reducers registered per channel.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Vec<Arc<dyn Reducer>>>,
}

/// Guard that checks whether a NodePartial actually has meaningful data
/// for the specified channel. Lets the registry skip invoking reducers
/// when there is nothing to do.
fn channel_guard(channel: ChannelType, partial: &NodePartial) -> bool {
    match channel {
        ChannelType::Message => partial
            .messages
            .as_ref()
            .is_some_and(|v| !v.is_empty()),
        ChannelType::Extra => partial.extra.as_ref().is_some_and(|m| !m.is_empty()),
        ChannelType::Error => partial.errors.as_ref().is_some_and(|v| !v.is_empty()),
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(ChannelType::Message, Arc::new(AppendMessages))
            .register(ChannelType::Extra, Arc::new(MapMerge))
            .register(ChannelType::Error, Arc::new(AppendErrors));
        registry
    }
}

impl ReducerRegistry {
    /// Creates a new empty reducer registry.
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Registers a reducer for a channel. Multiple reducers on one
    /// channel apply in registration order.
    pub fn register(&mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducer_map.entry(channel).or_default().push(reducer);
        self
    }

    /// Builder-style registration.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use cordon::reducers::{ReducerRegistry, AppendMessages};
    /// use cordon::types::ChannelType;
    ///
    /// let registry = ReducerRegistry::new()
    ///     .with_reducer(ChannelType::Message, Arc::new(AppendMessages));
    /// ```
    #[must_use]
    pub fn with_reducer(mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> Self {
        self.register(channel, reducer);
        self
    }

    /// Applies one channel's section of the update, if it carries data.
    #[instrument(skip(self, state, update), err)]
    pub fn try_update(
        &self,
        channel: ChannelType,
        state: &mut WorkflowState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        if !channel_guard(channel, update) {
            return Ok(());
        }

        match self.reducer_map.get(&channel) {
            Some(reducers) => {
                for reducer in reducers {
                    reducer.apply(state, update)?;
                }
                Ok(())
            }
            None => Err(ReducerError::UnknownChannel(channel)),
        }
    }

    /// Applies every channel of the update through its reducers.
    #[instrument(skip(self, state, update), err)]
    pub fn apply_all(
        &self,
        state: &mut WorkflowState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        for channel in [ChannelType::Message, ChannelType::Extra, ChannelType::Error] {
            self.try_update(channel, state, update)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use serde_json::json;

    #[test]
    fn guard_skips_empty_sections() {
        let empty = NodePartial::default();
        assert!(!channel_guard(ChannelType::Message, &empty));
        assert!(!channel_guard(ChannelType::Extra, &empty));
        assert!(!channel_guard(ChannelType::Error, &empty));

        let with_msg = NodePartial::new().with_messages(vec![Message::ai("m")]);
        assert!(channel_guard(ChannelType::Message, &with_msg));
        assert!(!channel_guard(ChannelType::Extra, &with_msg));
    }

    #[test]
    fn unknown_channel_only_errors_when_data_present() {
        let registry = ReducerRegistry::new();
        let mut state = WorkflowState::default();

        // No data -> guard short-circuits before the lookup.
        registry
            .try_update(ChannelType::Message, &mut state, &NodePartial::default())
            .expect("empty update is a no-op");

        let update = NodePartial::new().with_extra_value("k", json!(1));
        let err = registry
            .try_update(ChannelType::Extra, &mut state, &update)
            .unwrap_err();
        assert!(matches!(err, ReducerError::UnknownChannel(ChannelType::Extra)));
    }

    #[test]
    fn apply_all_touches_every_channel() {
        let registry = ReducerRegistry::default();
        let mut state = WorkflowState::default();
        let update = NodePartial::new()
            .with_messages(vec![Message::ai("merged")])
            .with_extra_value("origin", json!("node"));

        registry.apply_all(&mut state, &update).expect("merge");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.extra["origin"], json!("node"));
        assert!(state.errors.is_empty());
    }
}
