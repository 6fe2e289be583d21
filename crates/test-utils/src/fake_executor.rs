use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use builddag::dag::ScheduledTask;
use builddag::engine::{RuntimeEvent, TaskOutcome};
use builddag::errors::{Result, TaskError};
use builddag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports TaskCompleted for each scheduled task, failing
///   the ones listed in `failing`.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, tasks: &[&str]) -> Self {
        self.failing.extend(tasks.iter().map(|t| t.to_string()));
        self
    }
}

/// Error reported for tasks configured to fail.
pub fn fake_failure(task: &str) -> TaskError {
    TaskError::Command {
        cmd: format!("fake {task}"),
        code: Some(1),
        stderr: format!("{task} failed on purpose"),
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::failed(fake_failure(&t.name))
                } else {
                    TaskOutcome::Success(vec![PathBuf::from(format!("out/{}", t.name))])
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Executor that only forwards dispatched tasks to the test, which decides
/// when (and how) each one completes by sending events itself.
pub struct ManualExecutor {
    dispatched: mpsc::UnboundedSender<ScheduledTask>,
}

impl ManualExecutor {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScheduledTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { dispatched: tx }, rx)
    }
}

impl ExecutorBackend for ManualExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.dispatched.clone();
        Box::pin(async move {
            for t in tasks {
                tx.send(t).map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
