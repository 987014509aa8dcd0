// src/dag/graph.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::Task;

/// Internal node structure: stores immediate deps.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct dependencies: tasks whose payloads this one consumes.
    deps: Vec<String>,
}

/// Simple in-memory DAG representation keyed by task name.
///
/// The task set is assembled in code per scrape rather than read from config,
/// so feasibility ([`DagGraph::validate`]) is checked here before the first
/// wave; the scheduler refuses to run an infeasible set instead of spinning
/// on empty waves.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<String, DagNode>,
}

impl DagGraph {
    /// Build the adjacency from a task set.
    ///
    /// Fails on duplicate task names; dangling references and cycles are
    /// reported by [`DagGraph::validate`].
    pub fn from_tasks(tasks: &[Arc<dyn Task>]) -> Result<Self> {
        let mut nodes: HashMap<String, DagNode> = HashMap::new();

        for task in tasks {
            let previous = nodes.insert(
                task.name().to_string(),
                DagNode {
                    deps: task.dependencies(),
                },
            );
            if previous.is_some() {
                return Err(anyhow!("duplicate task name '{}'", task.name()));
            }
        }

        Ok(Self { nodes })
    }

    /// Check that every wave-based run over this graph can terminate:
    /// every dependency reference must name an existing task, no task may
    /// depend on itself, and there must be no cycle.
    ///
    /// Any violation is a wiring defect in the task set, not a runtime
    /// condition, so this returns a fatal error rather than degrading.
    pub fn validate(&self) -> Result<()> {
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                if dep == name {
                    return Err(anyhow!("task '{}' cannot depend on itself", name));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(anyhow!(
                        "task '{}' references unknown dependency '{}'",
                        name,
                        dep
                    ));
                }
            }
        }

        // Edge direction: dep -> task. A topological sort fails iff there is
        // a cycle.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(anyhow!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            )),
        }
    }

    /// Return all task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes.get(name).map(|n| n.deps.as_slice()).unwrap_or(&[])
    }
}
