use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use std::sync::Arc;

use cordon::message::{Message, Role};
use cordon::node::NodePartial;
use cordon::reducers::{AppendMessages, MapMerge, Reducer, ReducerError, ReducerRegistry};
use cordon::state::WorkflowState;
use cordon::types::ChannelType;

mod common;
use common::*;

// Fresh baseline state helper
fn base_state() -> WorkflowState {
    state_with_incident("a")
}

/********************
 * AppendMessages tests
 ********************/

#[test]
fn test_append_messages_appends_state() {
    let reducer = AppendMessages;
    let mut state = base_state();
    let initial_len = state.messages.len();

    let partial = NodePartial::new().with_messages(vec![Message::system("b")]);
    reducer.apply(&mut state, &partial).expect("merge");

    assert_eq!(state.messages.len(), initial_len + 1);
    assert!(state.messages[0].has_role(Role::Human));
    assert!(state.messages[1].has_role(Role::System));
}

#[test]
fn test_append_messages_empty_partial_noop() {
    let reducer = AppendMessages;
    let mut state = base_state();
    let initial = state.messages.clone();

    let partial = NodePartial::new().with_messages(vec![]);
    reducer.apply(&mut state, &partial).expect("merge");

    assert_eq!(state.messages, initial);
}

#[test]
fn test_append_messages_replaces_by_id() {
    let reducer = AppendMessages;
    let mut state = base_state();
    let first =
        NodePartial::new().with_messages(vec![Message::ai("draft verdict").with_id("verdict")]);
    reducer.apply(&mut state, &first).expect("merge");
    let position = state.messages.len() - 1;

    let revision =
        NodePartial::new().with_messages(vec![Message::ai("final verdict").with_id("verdict")]);
    reducer.apply(&mut state, &revision).expect("merge");

    // Replaced in place, not appended.
    assert_eq!(state.messages.len(), position + 1);
    assert_eq!(state.messages[position].content, "final verdict");
}

#[test]
fn test_append_messages_same_id_within_one_update() {
    let reducer = AppendMessages;
    let mut state = WorkflowState::default();
    let partial = NodePartial::new().with_messages(vec![
        Message::ai("first").with_id("note"),
        Message::ai("second").with_id("note"),
    ]);
    reducer.apply(&mut state, &partial).expect("merge");

    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].content, "second");
}

#[test]
fn test_messages_without_ids_always_append() {
    let reducer = AppendMessages;
    let mut state = WorkflowState::default();
    let partial =
        NodePartial::new().with_messages(vec![Message::ai("same text"), Message::ai("same text")]);
    reducer.apply(&mut state, &partial).expect("merge");
    assert_eq!(state.messages.len(), 2);
}

/********************
 * MapMerge (extra) tests
 ********************/

#[test]
fn test_map_merge_merges_and_overwrites_state() {
    let reducer = MapMerge;
    let mut state = base_state();
    state.add_extra("k1", Value::String("v1".into()));

    let mut extra_update = FxHashMap::default();
    extra_update.insert("k2".to_string(), Value::String("v2".into()));
    extra_update.insert("k1".to_string(), Value::String("v3".into())); // overwrite existing

    let partial = NodePartial::new().with_extra(extra_update);
    reducer.apply(&mut state, &partial).expect("merge");

    assert_extra_has(&state, "k1");
    assert_extra_has(&state, "k2");
    assert_eq!(
        state.extra.get("k1"),
        Some(&Value::String("v3".into())),
        "overwrite should succeed"
    );
    assert_eq!(
        state.extra.get("k2"),
        Some(&Value::String("v2".into())),
        "new key should be inserted"
    );
}

#[test]
fn test_map_merge_null_never_erases() {
    let reducer = MapMerge;
    let mut state = base_state();
    state.add_extra("severity", json!("high"));

    let mut extra_update = FxHashMap::default();
    extra_update.insert("severity".to_string(), Value::Null);
    extra_update.insert("fresh".to_string(), Value::Null);

    let partial = NodePartial::new().with_extra(extra_update);
    reducer.apply(&mut state, &partial).expect("merge");

    assert_eq!(state.extra.get("severity"), Some(&json!("high")));
    assert!(!state.extra.contains_key("fresh"));
}

#[test]
fn test_map_merge_empty_partial_noop() {
    let reducer = MapMerge;
    let mut state = base_state();
    state.add_extra("seed", Value::String("x".into()));
    let initial = state.extra.clone();

    let partial = NodePartial::new().with_extra(FxHashMap::default());
    reducer.apply(&mut state, &partial).expect("merge");

    assert_eq!(state.extra, initial);
}

/********************
 * Registry dispatch
 ********************/

#[test]
fn test_registry_routes_all_channels() {
    let registry = ReducerRegistry::default();
    let mut state = base_state();

    let mut extra_update = FxHashMap::default();
    extra_update.insert("origin".to_string(), Value::String("node".into()));

    let partial = NodePartial::new()
        .with_messages(vec![Message::ai("from node")])
        .with_extra(extra_update);

    registry.apply_all(&mut state, &partial).expect("merge");

    assert_message_contains(&state, "from node");
    assert_extra_has(&state, "origin");
}

#[test]
fn test_registry_unknown_channel() {
    // A registry with only a message reducer cannot merge extras.
    let registry =
        ReducerRegistry::new().with_reducer(ChannelType::Message, Arc::new(AppendMessages));
    let mut state = WorkflowState::default();
    let partial = NodePartial::new().with_extra_value("k", json!(1));

    let err = registry.apply_all(&mut state, &partial).unwrap_err();
    assert!(matches!(
        err,
        ReducerError::UnknownChannel(ChannelType::Extra)
    ));
}

#[test]
fn test_from_json_shape_error_mentions_channel() {
    let err = NodePartial::from_json(json!({"messages": {"not": "a list"}})).unwrap_err();
    match err {
        ReducerError::Shape { channel, .. } => assert_eq!(channel, ChannelType::Message),
        other => panic!("expected shape error, got {other:?}"),
    }
}

/*****************************
 * Concurrency
 *****************************/

/// Reducers applied from many tasks converge to the same length.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reducer_thread_safety() {
    let registry = Arc::new(ReducerRegistry::default());
    let state = Arc::new(tokio::sync::Mutex::new(base_state()));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let state = Arc::clone(&state);

            tokio::spawn(async move {
                let partial =
                    NodePartial::new().with_messages(vec![Message::ai(format!("msg_{i}"))]);
                let mut state_guard = state.lock().await;
                registry
                    .apply_all(&mut state_guard, &partial)
                    .expect("merge");
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let final_state = state.lock().await;
    // Initial state has 1 message, we added 10 more
    assert_eq!(final_state.messages.len(), 11);
}
