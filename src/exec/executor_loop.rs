// src/exec/executor_loop.rs

//! Main executor loop that runs scheduled tasks.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::ExecutionContext;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned sender is what [`PipelineExecutor`](super::PipelineExecutor)
/// forwards scheduled tasks to. Each task runs in its own Tokio task, and a
/// task name is executed **at most once** per build: a second request for
/// the same name is dropped.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: ExecutionContext,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut started: HashSet<TaskName> = HashSet::new();

        while let Some(task) = rx.recv().await {
            if !started.insert(task.name.clone()) {
                warn!(task = %task.name, "task already executed in this build; ignoring");
                continue;
            }

            let rt_tx = runtime_tx.clone();
            let ctx = ctx.clone();
            let name = task.name.clone();
            tokio::spawn(async move {
                run_task(task, ctx, rt_tx).await;
                debug!(task = %name, "task runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
