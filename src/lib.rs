//! # Cordon: a workflow graph engine for security-incident response
//!
//! Cordon executes compiled, validated graphs of async nodes over a
//! shared state that only advances through per-channel reducers. It
//! grew out of automating incident triage — classify, investigate,
//! contain, open a case — but the engine is generic over any pipeline
//! shaped as nodes plus routing.
//!
//! ## Core Concepts
//!
//! - **Reducer-merged state**: nodes return partial updates; reducers
//!   with fixed semantics (append with identity replace for messages,
//!   last-write-wins for fields, append-only errors) fold them in
//! - **Compile-then-run**: [`graphs::GraphBuilder`] validates the whole
//!   topology — entry point, edge endpoints, reachability, ambiguity —
//!   before producing an immutable [`workflow::Workflow`]
//! - **Contained failure**: a faulting node ends the run `failed` with
//!   the fault recorded in state; it never tears the process down
//! - **Explicit collaborators**: external systems live behind the
//!   [`capabilities`] traits and travel as one bundle, so tests swap a
//!   single seam
//!
//! ## Quick Start
//!
//! ```
//! use cordon::graphs::GraphBuilder;
//! use cordon::message::Message;
//! use cordon::node::{Node, NodeContext, NodeError, NodePartial};
//! use cordon::state::{StateSnapshot, WorkflowState};
//! use async_trait::async_trait;
//!
//! struct Acknowledge;
//!
//! #[async_trait]
//! impl Node for Acknowledge {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePartial, NodeError> {
//!         Ok(NodePartial::new().with_messages(vec![Message::ai("received")]))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> miette::Result<()> {
//! let workflow = GraphBuilder::new()
//!     .add_node("ack", Acknowledge)
//!     .set_entry_point("ack")
//!     .add_edge("ack", "End")
//!     .compile()
//!     .map_err(miette::Report::from)?;
//!
//! let final_state = workflow
//!     .invoke(WorkflowState::new_with_human_message("ping"))
//!     .await
//!     .map_err(miette::Report::from)?;
//! assert_eq!(final_state.messages.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//!
//! The same run loop can be observed step by step:
//!
//! ```ignore
//! let mut run = workflow.stream(initial_state);
//! while let Some(event) = run.next_event().await {
//!     let event = event?;
//!     println!("{} -> {:?}", event.node, event.snapshot.status);
//! }
//! let final_state = run.into_state();
//! ```
//!
//! ## Module Guide
//!
//! - [`message`]: transcript messages and roles
//! - [`state`]: [`state::WorkflowState`], snapshots, run status
//! - [`errors`]: structured error events recorded into state
//! - [`reducers`]: merge semantics and the registry
//! - [`node`]: the [`node::Node`] contract and partial updates
//! - [`graphs`]: builder, conditional edges, compile-time validation
//! - [`workflow`]: the sequential executor, invoke and stream surfaces
//! - [`capabilities`]: collaborator trait seams and in-memory stubs
//! - [`pipeline`]: the shipped incident-response graph

pub mod capabilities;
pub mod errors;
pub mod graphs;
pub mod message;
pub mod node;
pub mod pipeline;
pub mod reducers;
pub mod state;
pub mod types;
pub mod workflow;
