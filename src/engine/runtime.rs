// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::report::BuildReport;
use super::{CoreCommand, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s,
/// and delegates actual task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels and dispatching tasks to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial wave of ready tasks.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Executes commands returned by the core until every planned task is
    ///   terminal.
    pub async fn run(mut self) -> Result<BuildReport> {
        info!("builddag runtime started");

        let step = self.core.start();
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command).await?;
        }

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!("runtime event channel closed before the build finished");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            keep_running = step.keep_running;
        }

        info!("runtime exiting");
        Ok(self.core.report())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::RequestExit => {
                // keep_running=false accompanies this command; just log it.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
