// src/dag/task_info.rs

//! Task metadata and per-run state.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::dag::graph::TaskDescriptor;
use crate::engine::TaskName;
use crate::errors::TaskError;

/// Why a task never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    /// A (transitive) prerequisite failed.
    Upstream(TaskName),
    /// The run was cancelled before the task was dispatched.
    Cancelled,
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCause::Upstream(task) => write!(f, "prerequisite '{task}' failed"),
            SkipCause::Cancelled => write!(f, "build cancelled"),
        }
    }
}

/// Per-run state of a task (internal).
///
/// Transitions only move forward:
/// `Pending -> Running -> {Succeeded | Failed}` or `Pending -> Skipped`.
#[derive(Debug, Clone)]
pub enum RunState {
    /// Part of the plan, waiting on prerequisites or a free slot.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    Succeeded,
    Failed(Arc<TaskError>),
    Skipped(SkipCause),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed(_) | RunState::Skipped(_)
        )
    }
}

/// Public, read-only view of a task's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not reachable from the target.
    NotInRun,
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl From<Option<&RunState>> for TaskRunState {
    fn from(state: Option<&RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::Succeeded) => TaskRunState::Succeeded,
            Some(RunState::Failed(_)) => TaskRunState::Failed,
            Some(RunState::Skipped(_)) => TaskRunState::Skipped,
        }
    }
}

impl fmt::Display for TaskRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskRunState::NotInRun => "not-in-run",
            TaskRunState::Pending => "pending",
            TaskRunState::Running => "running",
            TaskRunState::Succeeded => "succeeded",
            TaskRunState::Failed => "failed",
            TaskRunState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Static task information plus its execution record.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct dependencies for this task (names in `after = [...]`).
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not part of the plan).
    pub run_state: Option<RunState>,

    /// Files written by a successful run.
    pub outputs: Vec<PathBuf>,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            deps,
            run_state: None,
            outputs: Vec::new(),
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub task: TaskDescriptor,
    /// 0-based dispatch sequence number within the run.
    pub sequence: usize,
}
