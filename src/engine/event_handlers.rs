// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::{TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Every planned task is terminal; the shell may stop.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn from_dispatch(scheduler: &Scheduler, ready: Vec<ScheduledTask>) -> Self {
        let mut commands = Vec::new();
        if !ready.is_empty() {
            commands.push(CoreCommand::DispatchTasks(ready));
        }

        let finished = scheduler.is_finished();
        if finished {
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running: !finished,
        }
    }
}

/// Dispatch the first wave of ready tasks.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let ready = scheduler.start();
    CoreStep::from_dispatch(scheduler, ready)
}

/// Handle a task completion event.
///
/// The scheduler applies the failure policy (skip dependents, or cancel
/// everything pending under `fail_fast`) before dispatching anything new.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let ready = scheduler.handle_completion(&task, outcome);
    CoreStep::from_dispatch(scheduler, ready)
}

/// Handle a cancellation request: pending tasks are skipped, running ones
/// are left to finish.
pub fn handle_cancel(scheduler: &mut Scheduler) -> CoreStep {
    let skipped = scheduler.cancel();
    info!(skipped = skipped.len(), "cancel requested");
    CoreStep::from_dispatch(scheduler, Vec::new())
}
