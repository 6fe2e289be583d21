// src/engine/build.rs

//! Entry points that run a build against the real pipeline executor.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::{Scheduler, TaskGraph};
use crate::engine::{BuildReport, BuildSettings, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::exec::{ExecutionContext, PipelineExecutor};
use crate::files::writer;
use crate::fs::FileSystem;

/// Build `target` and everything it transitively depends on.
///
/// Structural problems (unknown target, `jobs = 0`) are returned as `Err`
/// before any task runs. Task failures do not make this function fail; they
/// are recorded in the report, see [`BuildReport::into_result`].
pub async fn build(
    graph: Arc<TaskGraph>,
    target: &str,
    settings: &BuildSettings,
    fs: Arc<dyn FileSystem>,
) -> Result<BuildReport> {
    let scheduler = Scheduler::new(graph, target, settings.jobs)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(
        rt_tx.clone(),
        ExecutionContext::new(fs, settings.base_dir.clone()),
    );

    // Ctrl-C → stop dispatching, let running tasks finish.
    let ctrl_c = settings.cancel_on_ctrl_c.then(|| {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling build");
            let _ = tx.send(RuntimeEvent::CancelRequested).await;
        })
    });
    drop(rt_tx);

    let options = RuntimeOptions {
        fail_fast: settings.fail_fast,
    };
    let core = CoreRuntime::new(scheduler, options);
    let report = Runtime::new(core, rt_rx, executor).run().await;

    if let Some(handle) = ctrl_c {
        handle.abort();
    }
    report
}

/// Remove `output_dir`, then [`build`].
pub async fn clean_then_build(
    graph: Arc<TaskGraph>,
    target: &str,
    settings: &BuildSettings,
    fs: Arc<dyn FileSystem>,
    output_dir: &Path,
) -> Result<BuildReport> {
    // Fail on an unknown target before deleting anything.
    graph.plan(target)?;
    writer::clean(fs.as_ref(), output_dir)?;
    build(graph, target, settings, fs).await
}
