// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//!
//! The core is intended to be unit tested without any Tokio, channels,
//! filesystem, or processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_cancel, handle_start, handle_task_completion, CoreStep};
use crate::engine::report::BuildReport;
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Pure core runtime state.
///
/// This owns the scheduler of one build. It has
/// **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(mut scheduler: Scheduler, options: RuntimeOptions) -> Self {
        scheduler.set_fail_fast(options.fail_fast);
        Self { scheduler }
    }

    /// Whether every planned task is terminal.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Produce the commands that kick off the build.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, task, outcome)
            }
            RuntimeEvent::CancelRequested => handle_cancel(&mut self.scheduler),
        }
    }

    /// Snapshot of every task's terminal state.
    pub fn report(&self) -> BuildReport {
        BuildReport::from_scheduler(&self.scheduler)
    }
}
