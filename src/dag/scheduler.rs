use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, SkipCause, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{BuilddagError, Result, TaskError};

/// Scheduler holds the immutable graph plus the execution records of one
/// build.
///
/// It is responsible for:
/// - computing the plan for the target
/// - deciding when a pending task is "ready" (all prerequisites succeeded)
/// - capping the number of running tasks
/// - marking tasks as succeeded/failed
/// - skipping dependents of failed tasks, or everything pending on cancel
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    tasks: HashMap<TaskName, TaskInfo>,
    target: TaskName,
    plan: Vec<TaskName>,
    max_parallel: usize,
    dispatch_order: Vec<TaskName>,
    started: bool,
    cancelled: bool,
    fail_fast: bool,
}

impl Scheduler {
    /// Build the scheduler for one run of `target`.
    ///
    /// Fails with `UnknownTarget` if the target is not in the graph.
    pub fn new(graph: Arc<TaskGraph>, target: &str, max_parallel: usize) -> Result<Self> {
        if max_parallel == 0 {
            return Err(BuilddagError::ConfigError(
                "jobs must be >= 1 (got 0)".to_string(),
            ));
        }

        let plan = graph.plan(target)?;

        let mut tasks: HashMap<TaskName, TaskInfo> = graph
            .tasks()
            .map(|t| {
                (
                    t.name.clone(),
                    TaskInfo::new(t.name.clone(), t.prerequisites.clone()),
                )
            })
            .collect();

        StateManager::new(&graph, &mut tasks).mark_plan_pending(&plan);
        debug!(build_target = %target, ?plan, "build plan computed");

        Ok(Self {
            graph,
            tasks,
            target: target.to_string(),
            plan,
            max_parallel,
            dispatch_order: Vec::new(),
            started: false,
            cancelled: false,
            fail_fast: false,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Tasks of this run in topological order.
    pub fn plan(&self) -> &[TaskName] {
        &self.plan
    }

    /// Tasks in the order they were handed to the executor.
    pub fn dispatch_order(&self) -> &[TaskName] {
        &self.dispatch_order
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cancel everything still pending as soon as one task fails.
    pub fn set_fail_fast(&mut self, fail_fast: bool) {
        self.fail_fast = fail_fast;
    }

    /// Returns `true` once every task in the plan is terminal.
    pub fn is_finished(&self) -> bool {
        self.plan.iter().all(|name| {
            self.tasks
                .get(name)
                .and_then(|info| info.run_state.as_ref())
                .is_none_or(RunState::is_terminal)
        })
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.as_ref().into())
    }

    /// Error recorded for a failed task.
    pub fn failure_of(&self, task: &str) -> Option<Arc<TaskError>> {
        match self.tasks.get(task)?.run_state.as_ref()? {
            RunState::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    /// Why a task was skipped, if it was.
    pub fn skip_cause_of(&self, task: &str) -> Option<SkipCause> {
        match self.tasks.get(task)?.run_state.as_ref()? {
            RunState::Skipped(cause) => Some(cause.clone()),
            _ => None,
        }
    }

    /// Files written by a task that succeeded.
    pub fn outputs_of(&self, task: &str) -> &[PathBuf] {
        self.tasks
            .get(task)
            .map(|info| info.outputs.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the dependencies of `task` are satisfied for this run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Dispatch the first batch of ready tasks (production API).
    pub fn start(&mut self) -> Vec<ScheduledTask> {
        self.start_step_internal().newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome (production API).
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Stop dispatching; every pending task becomes skipped (production API).
    pub fn cancel(&mut self) -> Vec<TaskName> {
        self.cancel_step_internal().newly_skipped
    }

    /// Manual-step variant of `start` that returns a rich [`SchedulerStep`].
    pub fn step_start(&mut self) -> SchedulerStep {
        self.start_step_internal()
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Manual-step variant of `cancel` that returns a rich [`SchedulerStep`].
    pub fn step_cancel(&mut self) -> SchedulerStep {
        self.cancel_step_internal()
    }

    /// Returns all task names in declaration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.task_names()
    }

    /// Move newly ready tasks to `Running` and wrap them for the executor.
    fn dispatch_ready(&mut self) -> Vec<ScheduledTask> {
        if self.cancelled {
            return Vec::new();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let ready = manager.collect_new_ready_tasks(&self.plan, self.max_parallel);

        let mut scheduled = Vec::with_capacity(ready.len());
        for name in ready {
            let Some(task) = self.graph.get(&name) else {
                warn!(task = %name, "ready task missing from graph");
                continue;
            };
            scheduled.push(ScheduledTask {
                name: name.clone(),
                task: task.clone(),
                sequence: self.dispatch_order.len(),
            });
            self.dispatch_order.push(name);
        }
        scheduled
    }

    fn start_step_internal(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;
        info!(build_target = %self.target, tasks = self.plan.len(), "starting build");

        let newly_scheduled = self.dispatch_ready();
        SchedulerStep {
            newly_scheduled,
            run_just_finished: self.is_finished(),
            ..SchedulerStep::default()
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return step;
        };

        if !matches!(info.run_state, Some(RunState::Running)) {
            warn!(
                task = %task,
                state = %TaskRunState::from(info.run_state.as_ref()),
                "completion for task that is not running; ignoring"
            );
            return step;
        }

        match outcome {
            TaskOutcome::Success(outputs) => {
                debug!(task = %info.name, files = outputs.len(), "task completed successfully");
                info.run_state = Some(RunState::Succeeded);
                info.outputs = outputs;
            }
            TaskOutcome::Failed(err) => {
                warn!(
                    task = %info.name,
                    error = %err,
                    "task failed; skipping dependents in this run"
                );
                info.run_state = Some(RunState::Failed(err));
                step.newly_failed.push(info.name.clone());
                let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                step.newly_skipped = manager.mark_dependents_skipped(task);

                if self.fail_fast && !self.cancelled {
                    info!(task = %task, "fail_fast: cancelling remaining tasks");
                    step.newly_skipped
                        .extend(self.cancel_step_internal().newly_skipped);
                }
            }
        }

        step.newly_scheduled = self.dispatch_ready();
        step.run_just_finished = self.is_finished();
        if step.run_just_finished {
            info!(build_target = %self.target, "all planned tasks terminal; build finished");
        }
        step
    }

    fn cancel_step_internal(&mut self) -> SchedulerStep {
        if !self.cancelled {
            info!("cancellation requested; no further tasks will be dispatched");
        }
        self.cancelled = true;

        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let newly_skipped = manager.skip_all_pending(&self.plan);

        SchedulerStep {
            newly_skipped,
            run_just_finished: self.is_finished(),
            ..SchedulerStep::default()
        }
    }
}
