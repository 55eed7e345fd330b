use cordon::state::WorkflowState;

#[allow(dead_code)]
pub fn assert_message_contains(state: &WorkflowState, needle: &str) {
    let found = state.messages.iter().any(|m| m.content.contains(needle));
    assert!(
        found,
        "expected at least one message containing '{needle}', got: {:?}",
        state.messages
    );
}

#[allow(dead_code)]
pub fn assert_extra_has(state: &WorkflowState, key: &str) {
    assert!(
        state.extra.contains_key(key),
        "expected extra to have key '{key}', got keys: {:?}",
        state.extra.keys().collect::<Vec<_>>()
    );
}
