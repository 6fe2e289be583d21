// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor in [`executor_loop`](super::executor_loop).

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::ExecutionContext;
use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`PipelineExecutor`]; tests can provide their own
/// implementation that doesn't touch the file system.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Every dispatched task must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production.
///
/// Forwards scheduled tasks to the background loop started by
/// [`spawn_executor`], which runs each one on its own Tokio task.
pub struct PipelineExecutor {
    tx: mpsc::Sender<ScheduledTask>,
}

impl PipelineExecutor {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, ctx: ExecutionContext) -> Self {
        let tx = spawn_executor(runtime_tx, ctx);
        Self { tx }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
