// src/dag/plan.rs

//! Build plan for a target: its prerequisite closure in a stable
//! topological order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::dag::graph::TaskGraph;
use crate::engine::TaskName;
use crate::errors::{BuilddagError, Result};

impl TaskGraph {
    /// `target` plus every task reachable from it through prerequisite edges.
    pub fn closure(&self, target: &str) -> Result<HashSet<TaskName>> {
        if !self.contains(target) {
            return Err(BuilddagError::UnknownTarget(target.to_string()));
        }

        let mut visited: HashSet<TaskName> = HashSet::new();
        let mut stack: Vec<&str> = vec![target];
        while let Some(name) = stack.pop() {
            if !visited.insert(name.to_string()) {
                continue;
            }
            stack.extend(self.dependencies_of(name).iter().map(String::as_str));
        }
        Ok(visited)
    }

    /// Topological order of the target's closure (Kahn's algorithm).
    ///
    /// Among tasks that are ready at the same time, the one declared first
    /// comes first, so the plan is identical across runs.
    pub fn plan(&self, target: &str) -> Result<Vec<TaskName>> {
        let closure = self.closure(target)?;

        let mut indegree: HashMap<&str, usize> = closure
            .iter()
            .map(|name| (name.as_str(), self.dependencies_of(name).len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .filter_map(|(name, _)| self.declaration_index(name))
            .map(Reverse)
            .collect();

        let order_of: Vec<&str> = self.task_names().collect();
        let mut plan = Vec::with_capacity(closure.len());

        while let Some(Reverse(i)) = ready.pop() {
            let name = order_of[i];
            plan.push(name.to_string());

            for dependent in self.dependents_of(name) {
                if let Some(deg) = indegree.get_mut(dependent.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        if let Some(j) = self.declaration_index(dependent) {
                            ready.push(Reverse(j));
                        }
                    }
                }
            }
        }

        if plan.len() != closure.len() {
            // Unreachable for graphs built through `TaskGraph::new`.
            let mut stuck: Vec<TaskName> = closure
                .into_iter()
                .filter(|name| !plan.contains(name))
                .collect();
            stuck.sort_by_key(|name| self.declaration_index(name));
            return Err(BuilddagError::DagCycle { tasks: stuck });
        }

        Ok(plan)
    }
}
