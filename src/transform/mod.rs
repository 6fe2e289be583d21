// src/transform/mod.rs

//! The uniform transform interface and its concrete stages.
//!
//! A task's pipeline is a `Vec<Arc<dyn Transform>>` folded left to right
//! over the resolved buffers. The runner never looks at which stage it
//! holds; the closed [`TransformSpec`] enum only exists on the config side.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::model::{ToolsSection, TransformSpec};
use crate::errors::TaskError;
use crate::types::FileBuffer;

pub mod compile;
pub mod concat;
pub mod external;
pub mod gzip;
pub mod minify_css;
pub mod minify_js;
pub mod rename;

pub use compile::CompileToJs;
pub use concat::Concat;
pub use gzip::Gzip;
pub use minify_css::MinifyCss;
pub use minify_js::MinifyJs;
pub use rename::Rename;

/// Explicit inputs a transform may need besides the buffers themselves.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Task the pipeline belongs to (for diagnostics).
    pub task: String,
    /// Directory source patterns were resolved against; external tools run
    /// with this as their working directory.
    pub base_dir: PathBuf,
}

impl TransformContext {
    pub fn new(task: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            task: task.into(),
            base_dir: base_dir.into(),
        }
    }
}

pub trait Transform: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError>;
}

/// Build the runtime stage for a configured pipeline entry.
pub fn from_spec(spec: &TransformSpec, tools: &ToolsSection) -> Arc<dyn Transform> {
    match spec {
        TransformSpec::Concat(c) => Arc::new(Concat::new(c.name(), c.separator())),
        TransformSpec::Rename(r) => Arc::new(Rename::new(r.clone())),
        TransformSpec::MinifyCss => Arc::new(MinifyCss),
        TransformSpec::MinifyJs => Arc::new(MinifyJs::new(tools.minify_js.clone())),
        TransformSpec::CompileToJs(c) => Arc::new(CompileToJs::new(
            tools.compile_to_js.clone(),
            c.entry.clone(),
            c.output.as_str(),
        )),
        TransformSpec::Gzip => Arc::new(Gzip),
    }
}

/// Apply each stage in order, feeding outputs to the next stage.
pub fn apply_pipeline(
    pipeline: &[Arc<dyn Transform>],
    inputs: Vec<FileBuffer>,
    ctx: &TransformContext,
) -> Result<Vec<FileBuffer>, TaskError> {
    pipeline.iter().try_fold(inputs, |buffers, stage| {
        tracing::trace!(
            task = %ctx.task,
            transform = stage.name(),
            inputs = buffers.len(),
            "applying transform"
        );
        stage.apply(buffers, ctx)
    })
}

/// Helper for 1:1 stages.
pub(crate) fn map_each<F>(inputs: Vec<FileBuffer>, f: F) -> Result<Vec<FileBuffer>, TaskError>
where
    F: FnMut(FileBuffer) -> Result<FileBuffer, TaskError>,
{
    inputs.into_iter().map(f).collect()
}
