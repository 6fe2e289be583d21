// src/exec/task_runner.rs

//! Individual task runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::TaskError;
use crate::exec::ExecutionContext;
use crate::exec::pipeline::run_pipeline;

/// Run a single task and emit exactly one `TaskCompleted` event.
///
/// The optional shell command runs first; the file pipeline only runs if it
/// exits successfully. The pipeline itself is synchronous and executes on
/// the blocking pool.
pub async fn run_task(
    task: ScheduledTask,
    ctx: ExecutionContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(task = %task.name, sequence = task.sequence, "starting task");

    let outcome = match execute(&task, &ctx).await {
        Ok(written) => TaskOutcome::Success(written),
        Err(err) => {
            error!(task = %task.name, error = %err, "task failed");
            TaskOutcome::failed(err)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        warn!(task = %task.name, "runtime gone; dropping TaskCompleted event");
    }
}

async fn execute(task: &ScheduledTask, ctx: &ExecutionContext) -> Result<Vec<PathBuf>, TaskError> {
    if let Some(cmd) = task.task.cmd.as_deref() {
        run_command(&task.name, cmd, &ctx.base_dir).await?;
    }

    let fs = Arc::clone(&ctx.fs);
    let descriptor = task.task.clone();
    let base_dir = ctx.base_dir.clone();

    tokio::task::spawn_blocking(move || run_pipeline(fs.as_ref(), &descriptor, &base_dir))
        .await
        .map_err(|join_err| TaskError::Panicked(join_err.to_string()))?
}

/// Run `cmd` through the platform shell in `cwd`.
async fn run_command(task: &str, cmd: &str, cwd: &Path) -> Result<(), TaskError> {
    info!(task = %task, cmd = %cmd, "running task command");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    let output = command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| TaskError::Tool {
            tool: cmd.to_string(),
            source,
        })?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(task = %task, "stdout: {}", line);
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(TaskError::Command {
        cmd: cmd.to_string(),
        code: output.status.code(),
        stderr,
    })
}
