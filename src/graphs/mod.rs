//! Graph definition and compilation for workflow execution.
//!
//! The main entry point is [`GraphBuilder`], a fluent builder that
//! declares nodes, edges, conditional routing, and the entry point,
//! then compiles into an executable
//! [`Workflow`](crate::workflow::Workflow). Compilation validates the
//! whole structure up front; a compiled workflow cannot be mutated.
//!
//! # Core Concepts
//!
//! - **Nodes**: Executable units of work implementing the
//!   [`Node`](crate::node::Node) trait, registered by name
//! - **Edges**: A node's single unconditional successor
//! - **Conditional Edges**: A pure routing function plus a declared
//!   label→destination map ([`ConditionalEdge`])
//! - **Entry Point**: The one node that runs first
//! - **Terminal**: The virtual `End` destination that completes a run
//!
//! # Quick Start
//!
//! ```
//! use cordon::graphs::GraphBuilder;
//! use cordon::node::{Node, NodeContext, NodePartial, NodeError};
//! use cordon::state::StateSnapshot;
//! use async_trait::async_trait;
//!
//! struct MyNode;
//!
//! #[async_trait]
//! impl Node for MyNode {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePartial, NodeError> {
//!         Ok(NodePartial::default())
//!     }
//! }
//!
//! // entry -> process -> End
//! let workflow = GraphBuilder::new()
//!     .add_node("process", MyNode)
//!     .set_entry_point("process")
//!     .add_edge("process", "End")
//!     .compile()
//!     .expect("valid graph");
//! ```
//!
//! # Conditional Routing
//!
//! ```
//! # use cordon::graphs::{GraphBuilder, Router};
//! # use cordon::types::NodeKind;
//! # use std::sync::Arc;
//! # struct MyNode;
//! # #[async_trait::async_trait]
//! # impl cordon::node::Node for MyNode {
//! #     async fn run(&self, _: cordon::state::StateSnapshot, _: cordon::node::NodeContext) -> Result<cordon::node::NodePartial, cordon::node::NodeError> {
//! #         Ok(cordon::node::NodePartial::default())
//! #     }
//! # }
//! let needs_containment: Router = Arc::new(|snapshot| {
//!     if snapshot.extra.contains_key("compromised_host") {
//!         "contain".to_string()
//!     } else {
//!         "report".to_string()
//!     }
//! });
//!
//! let workflow = GraphBuilder::new()
//!     .add_node("assess", MyNode)
//!     .add_node("contain", MyNode)
//!     .add_node("report", MyNode)
//!     .set_entry_point("assess")
//!     .add_conditional_edges("assess", needs_containment, [
//!         ("contain", NodeKind::from("contain")),
//!         ("report", NodeKind::from("report")),
//!     ])
//!     .add_edge("contain", "report")
//!     .add_edge("report", "End")
//!     .compile()
//!     .expect("valid graph");
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphConfigError;
pub use edges::{ConditionalEdge, Router};
