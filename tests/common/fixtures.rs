use cordon::state::{StateSnapshot, WorkflowState};

#[allow(dead_code)]
pub fn empty_snapshot() -> StateSnapshot {
    WorkflowState::builder().build().snapshot()
}

#[allow(dead_code)]
pub fn state_with_incident(text: &str) -> WorkflowState {
    WorkflowState::new_with_human_message(text)
}
