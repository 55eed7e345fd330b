use async_trait::async_trait;
use serde_json::json;

use cordon::message::Message;
use cordon::node::{Node, NodeContext, NodeError, NodePartial};
use cordon::state::StateSnapshot;

/// Node that appends one fixed ai message.
#[derive(Debug, Clone)]
pub struct SimpleMessageNode {
    pub msg: &'static str,
}

impl SimpleMessageNode {
    pub fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[async_trait]
impl Node for SimpleMessageNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_messages(vec![Message::ai(self.msg)]))
    }
}

/// Node that returns an empty update.
#[derive(Debug, Clone)]
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::default())
    }
}

/// Node that writes one extra field.
#[derive(Debug, Clone)]
pub struct SetExtraNode {
    pub key: &'static str,
    pub value: &'static str,
}

impl SetExtraNode {
    pub fn new(key: &'static str, value: &'static str) -> Self {
        Self { key, value }
    }
}

#[async_trait]
impl Node for SetExtraNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with_extra_value(self.key, json!(self.value)))
    }
}

/// Node that always faults.
#[derive(Debug, Clone)]
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::ValidationFailed("boom".to_string()))
    }
}

/// Node that sleeps, for deadline tests.
#[derive(Debug, Clone)]
pub struct SlowNode {
    pub millis: u64,
}

#[async_trait]
impl Node for SlowNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        tokio::time::sleep(std::time::Duration::from_millis(self.millis)).await;
        Ok(NodePartial::new().with_extra_value("slept_ms", json!(self.millis)))
    }
}
