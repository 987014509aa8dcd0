// src/dag/scheduler.rs

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::dag::{DagGraph, Task};
use crate::fetch::QueryOutcome;
use crate::state::State;
use crate::tasks::FetchContext;

/// Wave executor: drives a task set to completion respecting declared
/// dependencies, maximizing parallelism, and isolating failures.
///
/// One `run` call services one scrape. Each iteration computes the set of
/// not-yet-done tasks whose dependencies are all done, launches them
/// concurrently, and waits for the whole wave before the next iteration, so
/// a dependent never observes a missing or in-flight payload.
pub struct Controller {
    tasks: Vec<Arc<dyn Task>>,
}

impl Controller {
    pub fn new(tasks: Vec<Arc<dyn Task>>) -> Self {
        Self { tasks }
    }

    /// Run every task once.
    ///
    /// Remote failures inside tasks never surface here; they are already
    /// folded into outcomes and degraded payloads. An `Err` from this
    /// function always means a wiring defect (duplicate name, dangling
    /// dependency, cycle) or a task panic, and aborts the scrape.
    pub async fn run(&self, ctx: Arc<FetchContext>) -> Result<(State, Vec<QueryOutcome>)> {
        let graph = DagGraph::from_tasks(&self.tasks)?;
        graph.validate()?;

        let state = State::new();
        let mut outcomes: Vec<QueryOutcome> = Vec::new();
        let mut done: HashSet<String> = HashSet::new();
        let mut waves = 0u32;

        while done.len() < self.tasks.len() {
            let ready: Vec<Arc<dyn Task>> = self
                .tasks
                .iter()
                .filter(|task| !done.contains(task.name()))
                .filter(|task| task.dependencies().iter().all(|dep| done.contains(dep)))
                .cloned()
                .collect();

            if ready.is_empty() {
                // Unreachable after validate(), but a silent spin here would
                // hang the scrape, so keep the guard.
                bail!(
                    "task graph stalled with {} of {} tasks outstanding",
                    self.tasks.len() - done.len(),
                    self.tasks.len()
                );
            }

            waves += 1;
            debug!(wave = waves, ready = ready.len(), "launching wave");

            let mut joins: JoinSet<(String, crate::dag::TaskOutput)> = JoinSet::new();

            for task in ready {
                // Dependency payloads are cloned out of the store before the
                // task is spawned; all producers completed in earlier waves.
                let mut deps = Vec::with_capacity(task.dependencies().len());
                for dep in task.dependencies() {
                    let payload = state.get(&dep).with_context(|| {
                        format!(
                            "dependency '{}' of task '{}' has no stored payload",
                            dep,
                            task.name()
                        )
                    })?;
                    deps.push(payload);
                }

                let ctx = Arc::clone(&ctx);
                joins.spawn(async move {
                    let name = task.name().to_string();
                    let output = task.run(&ctx, deps).await;
                    (name, output)
                });
            }

            // Wave barrier: every member finishes before the next ready-set
            // computation.
            while let Some(joined) = joins.join_next().await {
                let (name, output) = joined.context("fetch task panicked")?;
                debug!(
                    task = %name,
                    queries = output.outcomes.len(),
                    "task completed"
                );
                state.set(&name, output.payload);
                outcomes.extend(output.outcomes);
                done.insert(name);
            }
        }

        info!(
            tasks = done.len(),
            waves,
            queries = outcomes.len(),
            "scrape run complete"
        );

        Ok((state, outcomes))
    }
}
