// src/state.rs

//! Run-scoped result store.
//!
//! One [`State`] is created per scrape, populated by the scheduler as tasks
//! complete, consumed by the rendering stage, and then dropped. Nothing in
//! here survives between scrapes.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::tasks::delegations::DelegationCounts;
use crate::tasks::node_status::NodeStatus;
use crate::tasks::validators::ValidatorInfo;

/// Payload produced by a task, keyed by task name in the [`State`].
///
/// This is a closed union: each task family owns one variant, and dependents
/// read it back through the matching `as_*` accessor. Getting `None` from an
/// accessor while the entry exists and is not [`Payload::Absent`] means the
/// producer/consumer contract is broken; callers treat that as a fatal bug,
/// not a runtime condition.
///
/// `Absent` is different: the producer ran but chose not to populate anything
/// (every relevant query disabled, for instance). Consumers must handle it.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Producer completed without producing data.
    Absent,
    /// Chain name -> latest-block status.
    NodeStatus(HashMap<String, NodeStatus>),
    /// Chain name -> tracked validators.
    Validators(HashMap<String, Vec<ValidatorInfo>>),
    /// Chain name -> per-validator delegator counts.
    Delegations(HashMap<String, DelegationCounts>),
    /// Currency id -> USD price.
    Prices(HashMap<String, f64>),
}

impl Payload {
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    pub fn as_node_status(&self) -> Option<&HashMap<String, NodeStatus>> {
        match self {
            Payload::NodeStatus(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_validators(&self) -> Option<&HashMap<String, Vec<ValidatorInfo>>> {
        match self {
            Payload::Validators(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_delegations(&self) -> Option<&HashMap<String, DelegationCounts>> {
        match self {
            Payload::Delegations(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_prices(&self) -> Option<&HashMap<String, f64>> {
        match self {
            Payload::Prices(m) => Some(m),
            _ => None,
        }
    }
}

/// Concurrency-safe task-name -> payload mapping for one run.
///
/// The scheduler guarantees a name is written exactly once and only read
/// after its producing wave completed, so the lock only ever guards the
/// instant of inserting or cloning one entry. It is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct State {
    entries: Mutex<HashMap<String, Payload>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task's payload. Single-writer per name; a second write to the
    /// same name indicates a scheduler bug and is logged before overwriting.
    pub fn set(&self, name: &str, payload: Payload) {
        let mut entries = self.entries.lock().unwrap();
        if entries.insert(name.to_string(), payload).is_some() {
            warn!(task = %name, "state entry written twice; overwriting");
        }
    }

    /// Fetch a task's payload, if its producer has completed.
    pub fn get(&self, name: &str) -> Option<Payload> {
        self.entries.lock().unwrap().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
