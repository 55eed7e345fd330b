//! Compiled workflows and the sequential run loop.
//!
//! A [`Workflow`] is the immutable product of
//! [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile).
//! Execution is strictly sequential: one node at a time, its update
//! merged through the reducers before routing decides the next node.
//!
//! Two consumption styles share the same loop:
//! - [`Workflow::invoke`] runs to a terminal status and returns the
//!   final state
//! - [`Workflow::stream`] yields a [`StepEvent`] per completed node,
//!   carrying the raw update and the post-merge snapshot
//!
//! # Failure containment
//!
//! A node returning `Err` does not tear the run down. The fault is
//! recorded into the state's error channel, the run ends with status
//! `failed`, and `invoke` still returns `Ok(state)` so the caller gets
//! everything merged up to the fault. Only configuration problems
//! (routing to an unmapped label, dead ends), merge failures, and an
//! exhausted step budget surface as [`WorkflowError`].

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::instrument;

use crate::errors::{CauseChain, ErrorEvent};
use crate::graphs::{ConditionalEdge, GraphConfigError};
use crate::node::{Node, NodeContext, NodePartial};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::state::{RunStatus, StateSnapshot, WorkflowState};
use crate::types::NodeKind;

/// Execution limits for a compiled workflow.
///
/// The step limit bounds total node executions per run, so a cycle that
/// never routes to the terminal fails loudly instead of spinning. The
/// deadline, when set, cancels the run between nodes — a node is never
/// interrupted mid-flight.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Maximum node executions per run.
    pub step_limit: usize,
    /// Wall-clock budget for the whole run.
    pub deadline: Option<Duration>,
}

impl RuntimeConfig {
    /// Default cap on node executions per run.
    pub const DEFAULT_STEP_LIMIT: usize = 256;

    /// Overrides the step limit.
    #[must_use]
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Sets a wall-clock deadline for runs.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_limit: Self::DEFAULT_STEP_LIMIT,
            deadline: None,
        }
    }
}

/// Fatal run errors.
///
/// Node faults are absent deliberately: they are contained into state
/// (see module docs). Everything here means the graph or an update was
/// wrong, not that an incident-response step failed.
#[derive(Debug, Error, Diagnostic)]
pub enum WorkflowError {
    /// A structural problem surfaced at runtime (dead end).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] GraphConfigError),

    /// A router returned a label its edge never declared.
    ///
    /// Carries the state as merged up to and including the node that
    /// triggered the route, so nothing already computed is lost.
    #[error("router at node {node:?} returned unmapped label {label:?}")]
    #[diagnostic(
        code(cordon::workflow::routing),
        help("Declare the label in the conditional edge's target map, or fix the router.")
    )]
    Routing {
        node: String,
        label: String,
        state: Box<WorkflowState>,
    },

    /// The run executed its maximum number of nodes without reaching
    /// the terminal.
    #[error("step budget of {limit} node executions exhausted")]
    #[diagnostic(
        code(cordon::workflow::step_budget),
        help("Check conditional routers for loops, or raise the limit via RuntimeConfig.")
    )]
    StepBudgetExceeded { limit: usize },

    /// An update could not be merged.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Reducer(#[from] ReducerError),
}

/// One completed node execution, as observed by a streaming consumer.
#[derive(Clone, Debug)]
pub struct StepEvent {
    /// The node that ran.
    pub node: String,
    /// The raw update it returned (or the synthesized error update for
    /// a contained fault).
    pub update: NodePartial,
    /// The state after merging the update.
    pub snapshot: StateSnapshot,
}

/// A compiled, immutable workflow.
///
/// Cloning is cheap-ish (maps of `Arc`s) and every clone shares the
/// same node implementations. There is no way to alter topology after
/// compile; build a new graph instead.
#[derive(Clone)]
pub struct Workflow {
    nodes: FxHashMap<String, Arc<dyn Node>>,
    edges: FxHashMap<String, NodeKind>,
    conditional_edges: FxHashMap<String, ConditionalEdge>,
    entry: String,
    reducers: ReducerRegistry,
    config: RuntimeConfig,
}

impl Workflow {
    pub(crate) fn from_parts(
        nodes: FxHashMap<String, Arc<dyn Node>>,
        edges: FxHashMap<String, NodeKind>,
        conditional_edges: FxHashMap<String, ConditionalEdge>,
        entry: String,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            nodes,
            edges,
            conditional_edges,
            entry,
            reducers: ReducerRegistry::default(),
            config,
        }
    }

    /// Registered node names.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// The single unconditional successor per source node.
    pub fn edges(&self) -> &FxHashMap<String, NodeKind> {
        &self.edges
    }

    /// The conditional edge per source node, if any.
    pub fn conditional_edges(&self) -> &FxHashMap<String, ConditionalEdge> {
        &self.conditional_edges
    }

    /// The entry point node name.
    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// The runtime configuration this workflow was compiled with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs the workflow to a terminal status and returns final state.
    ///
    /// Returns `Err` only for configuration, routing, budget, or merge
    /// failures; contained node faults end with `Ok` and status
    /// `failed`.
    #[instrument(skip(self, initial), fields(entry = %self.entry), err)]
    pub async fn invoke(&self, initial: WorkflowState) -> Result<WorkflowState, WorkflowError> {
        let mut run = self.stream(initial);
        while let Some(event) = run.next_event().await {
            event?;
        }
        Ok(run.into_state())
    }

    /// Like [`invoke`](Self::invoke), with a deadline overriding the
    /// compiled configuration for this run only.
    pub async fn invoke_with_deadline(
        &self,
        initial: WorkflowState,
        deadline: Duration,
    ) -> Result<WorkflowState, WorkflowError> {
        let mut run = self.stream_with_deadline(initial, deadline);
        while let Some(event) = run.next_event().await {
            event?;
        }
        Ok(run.into_state())
    }

    /// Starts a streaming run yielding one [`StepEvent`] per node.
    ///
    /// The stream is finite (bounded by the step budget), single-use,
    /// and safe to abandon: dropping it stops the run, and the engine
    /// holds no state outside the [`RunStream`].
    #[must_use]
    pub fn stream(&self, initial: WorkflowState) -> RunStream {
        RunStream::new(self.clone(), initial, self.config.deadline)
    }

    /// Like [`stream`](Self::stream), with a per-run deadline.
    #[must_use]
    pub fn stream_with_deadline(&self, initial: WorkflowState, deadline: Duration) -> RunStream {
        RunStream::new(self.clone(), initial, Some(deadline))
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An in-flight sequential run.
///
/// Produced by [`Workflow::stream`]; also drives `invoke` internally so
/// both surfaces share one loop.
pub struct RunStream {
    workflow: Workflow,
    state: WorkflowState,
    current: Option<String>,
    step: u64,
    deadline: Option<Instant>,
    halted: bool,
}

impl RunStream {
    fn new(workflow: Workflow, state: WorkflowState, deadline: Option<Duration>) -> Self {
        let current = Some(workflow.entry.clone());
        Self {
            workflow,
            state,
            current,
            step: 0,
            deadline: deadline.map(|d| Instant::now() + d),
            halted: false,
        }
    }

    /// The state as merged so far.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Consumes the run, returning the state as merged so far.
    #[must_use]
    pub fn into_state(self) -> WorkflowState {
        self.state
    }

    /// Advances by one node execution.
    ///
    /// `None` means the run is over: terminal reached, fault contained,
    /// deadline expired, or a previous call already returned an error.
    pub async fn next_event(&mut self) -> Option<Result<StepEvent, WorkflowError>> {
        if self.halted || self.state.status.is_terminal() {
            return None;
        }
        let node_name = self.current.clone()?;

        // Deadline gates the next execution, never a running node.
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            tracing::warn!(target: "cordon::run", node = %node_name, step = self.step,
                "deadline expired, cancelling run");
            self.state.status = RunStatus::Cancelled;
            return None;
        }

        self.step += 1;
        if self.step as usize > self.workflow.config.step_limit {
            self.halted = true;
            return Some(Err(WorkflowError::StepBudgetExceeded {
                limit: self.workflow.config.step_limit,
            }));
        }

        let Some(node) = self.workflow.nodes.get(&node_name).cloned() else {
            // Compile guarantees edges point at registered nodes.
            self.halted = true;
            return Some(Err(GraphConfigError::UnknownEdgeSource {
                from: node_name,
            }
            .into()));
        };

        tracing::debug!(target: "cordon::run", node = %node_name, step = self.step, "running node");
        let ctx = NodeContext::new(node_name.clone(), self.step);
        let update = match node.run(self.state.snapshot(), ctx).await {
            Ok(update) => update,
            Err(fault) => {
                // Contained: record the fault, end the run as failed.
                tracing::error!(target: "cordon::run", node = %node_name, step = self.step,
                    error = %fault, "node fault contained");
                let event = ErrorEvent::node(&node_name, self.step, CauseChain::from_error(&fault))
                    .with_tag("contained");
                let update = NodePartial::new().with_errors(vec![event]);
                if let Err(err) = self.workflow.reducers.apply_all(&mut self.state, &update) {
                    self.halted = true;
                    return Some(Err(err.into()));
                }
                self.state.status = RunStatus::Failed;
                self.current = None;
                return Some(Ok(StepEvent {
                    node: node_name,
                    update,
                    snapshot: self.state.snapshot(),
                }));
            }
        };

        if let Err(err) = self.workflow.reducers.apply_all(&mut self.state, &update) {
            self.halted = true;
            return Some(Err(err.into()));
        }

        // Route on the merged state.
        let next = if let Some(edge) = self.workflow.conditional_edges.get(&node_name) {
            let label = (edge.router())(&self.state.snapshot());
            match edge.resolve(&label) {
                Some(kind) => kind.clone(),
                None => {
                    self.halted = true;
                    return Some(Err(WorkflowError::Routing {
                        node: node_name,
                        label,
                        state: Box::new(self.state.clone()),
                    }));
                }
            }
        } else if let Some(kind) = self.workflow.edges.get(&node_name) {
            kind.clone()
        } else {
            self.halted = true;
            return Some(Err(GraphConfigError::DeadEnd { node: node_name }.into()));
        };

        match next {
            NodeKind::End => {
                self.current = None;
                self.state.status = RunStatus::Completed;
            }
            NodeKind::Custom(name) => {
                self.current = Some(name);
            }
        }

        Some(Ok(StepEvent {
            node: node_name,
            update,
            snapshot: self.state.snapshot(),
        }))
    }

    /// Adapts the run into a boxed `futures` stream.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, Result<StepEvent, WorkflowError>> {
        futures_util::stream::unfold(self, |mut run| async move {
            run.next_event().await.map(|event| (event, run))
        })
        .boxed()
    }
}
