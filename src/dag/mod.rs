// src/dag/mod.rs

//! Task contract and dependency-aware scheduling.
//!
//! - [`graph`] holds a directed acyclic graph of tasks plus feasibility
//!   validation.
//! - [`scheduler`] contains the wave executor that drives a task set to
//!   completion per scrape.

pub mod graph;
pub mod scheduler;

pub use graph::DagGraph;
pub use scheduler::Controller;

use async_trait::async_trait;

use crate::fetch::QueryOutcome;
use crate::state::Payload;
use crate::tasks::FetchContext;

/// What a task hands back to the scheduler.
#[derive(Debug)]
pub struct TaskOutput {
    /// Stored in the run's [`crate::state::State`] under the task's name.
    pub payload: Payload,
    /// One record per remote call actually attempted by this task.
    pub outcomes: Vec<QueryOutcome>,
}

impl TaskOutput {
    pub fn new(payload: Payload, outcomes: Vec<QueryOutcome>) -> Self {
        Self { payload, outcomes }
    }

    /// Output for a task that ran but produced nothing (all queries disabled,
    /// for instance).
    pub fn absent() -> Self {
        Self {
            payload: Payload::Absent,
            outcomes: Vec::new(),
        }
    }
}

/// The unit of work the scheduler drives.
///
/// Implementations must absorb ordinary remote failures: a refused
/// connection, timeout, bad body, or stale response becomes a failed entry in
/// [`TaskOutput::outcomes`] plus a degraded (possibly [`Payload::Absent`])
/// payload. `run` itself never fails; a panic inside it is treated by the
/// scheduler as a programming error and aborts the whole run.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable name, unique within a task set.
    fn name(&self) -> &str;

    /// Names of the tasks whose payloads this one consumes, in the order
    /// they should be passed to [`Task::run`].
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Do the work. `deps` holds the payloads of [`Task::dependencies`] in
    /// declaration order; the wave barrier guarantees each producer has
    /// completed, though any of them may be degraded or `Absent`.
    async fn run(&self, ctx: &FetchContext, deps: Vec<Payload>) -> TaskOutput;
}
