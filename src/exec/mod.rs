// src/exec/mod.rs

//! Task execution layer.
//!
//! This module actually runs the tasks handed out by the scheduler and
//! reports back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the background loop that receives scheduled tasks.
//! - [`task_runner`] runs one task: optional shell command, then the pipeline.
//! - [`pipeline`] resolves sources, applies transforms and writes outputs.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `PipelineExecutor`; tests replace it with a fake implementation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::fs::FileSystem;

pub mod backend;
pub mod executor_loop;
pub mod pipeline;
pub mod task_runner;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use executor_loop::spawn_executor;
pub use pipeline::run_pipeline;

/// Everything a running task needs besides its own descriptor.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub fs: Arc<dyn FileSystem>,
    /// Sources, destinations and commands are relative to this directory.
    pub base_dir: PathBuf,
}

impl ExecutionContext {
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base_dir: base_dir.into(),
        }
    }
}
