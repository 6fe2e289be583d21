// src/engine/mod.rs

//! Orchestration engine for builddag.
//!
//! This module ties together:
//! - the scheduler (which tasks may run now)
//! - the main runtime event loop that reacts to:
//!   - task completion events from the executor
//!   - cancellation requests (Ctrl-C)
//! - the final [`BuildReport`]
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. [`build`] wires both to the real executor.

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::TaskError;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task execution for the scheduler.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// Task finished; these are the files it wrote.
    Success(Vec<PathBuf>),
    Failed(Arc<TaskError>),
}

impl TaskOutcome {
    pub fn failed(err: TaskError) -> Self {
        TaskOutcome::Failed(Arc::new(err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }
}

/// Runtime options used by the core.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Cancel the rest of the run after the first failure instead of
    /// continuing with independent branches.
    pub fail_fast: bool,
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Stop dispatching; running tasks finish (e.g. Ctrl-C).
    CancelRequested,
}

/// Immutable settings for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Maximum number of tasks running at once (>= 1).
    pub jobs: usize,
    pub fail_fast: bool,
    /// Directory that sources, destinations and tool invocations are
    /// relative to.
    pub base_dir: PathBuf,
    /// Translate Ctrl-C into a cancellation request.
    pub cancel_on_ctrl_c: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
            base_dir: PathBuf::from("."),
            cancel_on_ctrl_c: false,
        }
    }
}

pub mod build;
pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use build::{build, clean_then_build};
pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{BuildReport, TaskReport};
pub use runtime::Runtime;
