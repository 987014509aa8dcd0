// src/tasks/mod.rs

//! Concrete fetch tasks, one concern per file, plus the shared context they
//! all receive.
//!
//! Each task absorbs its own remote failures: nothing in here ever bubbles a
//! transport or decode error up to the scheduler.

pub mod context;
pub mod delegations;
pub mod node_status;
pub mod price;
pub mod validators;

pub use context::{ChainHandle, FetchContext};

use std::sync::Arc;

use crate::dag::Task;

/// Assemble the task set for one scrape.
///
/// The returned set is acyclic by construction; the scheduler still validates
/// it before running.
pub fn build_task_set() -> Vec<Arc<dyn Task>> {
    vec![
        Arc::new(node_status::NodeStatusTask),
        Arc::new(validators::ValidatorsTask),
        Arc::new(delegations::DelegationsTask),
        Arc::new(price::PriceTask),
    ]
}
