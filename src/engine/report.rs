// src/engine/report.rs

//! Per-task summary of a finished (or cancelled) build.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::dag::{Scheduler, SkipCause, TaskRunState};
use crate::engine::TaskName;
use crate::errors::{BuilddagError, Result, TaskError};

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: TaskName,
    pub state: TaskRunState,
    pub error: Option<Arc<TaskError>>,
    pub skip_cause: Option<SkipCause>,
    pub outputs: Vec<PathBuf>,
}

/// Every planned task with its terminal state, in plan order.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub target: TaskName,
    pub plan: Vec<TaskName>,
    pub dispatch_order: Vec<TaskName>,
    pub tasks: Vec<TaskReport>,
    pub cancelled: bool,
}

impl BuildReport {
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let tasks = scheduler
            .plan()
            .iter()
            .map(|name| TaskReport {
                name: name.clone(),
                state: scheduler
                    .run_state_of(name)
                    .unwrap_or(TaskRunState::NotInRun),
                error: scheduler.failure_of(name),
                skip_cause: scheduler.skip_cause_of(name),
                outputs: scheduler.outputs_of(name).to_vec(),
            })
            .collect();

        Self {
            target: scheduler.target().to_string(),
            plan: scheduler.plan().to_vec(),
            dispatch_order: scheduler.dispatch_order().to_vec(),
            tasks,
            cancelled: scheduler.is_cancelled(),
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn state_of(&self, name: &str) -> Option<TaskRunState> {
        self.task(name).map(|t| t.state)
    }

    /// True iff the target and all its prerequisites succeeded.
    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskRunState::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.state == TaskRunState::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.state == TaskRunState::Skipped)
    }

    /// Union of every file written during the build.
    pub fn written_paths(&self) -> BTreeSet<PathBuf> {
        self.tasks
            .iter()
            .flat_map(|t| t.outputs.iter().cloned())
            .collect()
    }

    /// `Ok(written paths)` on full success, otherwise `BuildFailed`.
    pub fn into_result(self) -> Result<BTreeSet<PathBuf>> {
        if self.is_success() {
            return Ok(self.written_paths());
        }

        // Tasks left Running/Pending (e.g. executor went away) count as failed.
        let failed = self
            .tasks
            .iter()
            .filter(|t| !matches!(t.state, TaskRunState::Succeeded | TaskRunState::Skipped))
            .map(|t| t.name.clone())
            .collect();
        let skipped = self.skipped().map(|t| t.name.clone()).collect();
        Err(BuilddagError::BuildFailed { failed, skipped })
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "build summary for '{}':", self.target)?;
        for task in &self.tasks {
            write!(f, "  {:<10} {}", task.state.to_string(), task.name)?;
            match (&task.error, &task.skip_cause) {
                (Some(err), _) => write!(f, ": {err}")?,
                (None, Some(cause)) => write!(f, " ({cause})")?,
                (None, None) if !task.outputs.is_empty() => {
                    write!(f, " ({} file(s))", task.outputs.len())?
                }
                _ => {}
            }
            writeln!(f)?;
        }

        let failed = self.failed().count();
        let skipped = self.skipped().count();
        if self.is_success() {
            writeln!(f, "ok: {} task(s) succeeded", self.tasks.len())
        } else {
            writeln!(
                f,
                "FAILED: {failed} failed, {skipped} skipped{}",
                if self.cancelled { " (cancelled)" } else { "" }
            )
        }
    }
}
