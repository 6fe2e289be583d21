// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{RunState, SkipCause, TaskInfo};
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a TaskGraph, tasks: &'a mut HashMap<TaskName, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// Put every task of the plan into `Pending`.
    pub fn mark_plan_pending(&mut self, plan: &[TaskName]) {
        for name in plan {
            if let Some(info) = self.tasks.get_mut(name) {
                info.run_state = Some(RunState::Pending);
                debug!(task = %info.name, "marked Pending for this run");
            } else {
                warn!(task = %name, "planned task not present in tasks map");
            }
        }
    }

    /// Determine whether all dependencies of the given task have succeeded.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Mark every pending task that transitively depends on `failed_task`
    /// as skipped, naming `failed_task` as the cause.
    ///
    /// Returns the tasks that were newly skipped.
    pub fn mark_dependents_skipped(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut visited: HashSet<TaskName> = HashSet::new();
        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(info) = self.tasks.get_mut(&name) {
                if matches!(info.run_state, Some(RunState::Pending)) {
                    info.run_state = Some(RunState::Skipped(SkipCause::Upstream(
                        failed_task.to_string(),
                    )));
                    debug!(
                        task = %info.name,
                        cause = %failed_task,
                        "skipping dependent due to upstream failure"
                    );
                    newly_skipped.push(info.name.clone());
                }
            }
            stack.extend(self.graph.dependents_of(&name).iter().cloned());
        }

        newly_skipped
    }

    /// Skip every task that has not been dispatched yet.
    pub fn skip_all_pending(&mut self, plan: &[TaskName]) -> Vec<TaskName> {
        let mut skipped = Vec::new();
        for name in plan {
            if let Some(info) = self.tasks.get_mut(name) {
                if matches!(info.run_state, Some(RunState::Pending)) {
                    info.run_state = Some(RunState::Skipped(SkipCause::Cancelled));
                    skipped.push(info.name.clone());
                }
            }
        }
        skipped
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return their names in plan order.
    ///
    /// At most `max_parallel` tasks are `Running` afterwards.
    pub fn collect_new_ready_tasks(
        &mut self,
        plan: &[TaskName],
        max_parallel: usize,
    ) -> Vec<TaskName> {
        let mut running = self
            .tasks
            .values()
            .filter(|info| matches!(info.run_state, Some(RunState::Running)))
            .count();

        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = plan
            .iter()
            .filter(|name| {
                self.tasks.get(*name).is_some_and(|info| {
                    matches!(info.run_state, Some(RunState::Pending))
                        && self.deps_satisfied_for_info(info)
                })
            })
            .cloned()
            .collect();

        let mut ready = Vec::new();
        for name in candidates {
            if running >= max_parallel {
                debug!(task = %name, max_parallel, "ready but all slots busy");
                break;
            }
            if let Some(info) = self.tasks.get_mut(&name) {
                info!(task = %info.name, "dependencies satisfied; dispatching task");
                info.run_state = Some(RunState::Running);
                running += 1;
                ready.push(name);
            }
        }

        ready
    }
}

/// A read-only view of the state manager for checking dependency satisfaction.
///
/// This is used when we only have shared access to the tasks map (e.g. in `Scheduler::deps_satisfied`).
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A task may run once every direct dependency has succeeded in this
    /// run. Since plans are prerequisite-closed, that covers transitive ones.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep_name| match self.tasks.get(dep_name) {
            Some(dep) => matches!(dep.run_state, Some(RunState::Succeeded)),
            None => {
                warn!(
                    task = %info.name,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                false
            }
        })
    }
}
