// src/exec/pipeline.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dag::TaskDescriptor;
use crate::errors::TaskError;
use crate::files::{resolve, write};
use crate::fs::FileSystem;
use crate::transform::{TransformContext, apply_pipeline};

/// Run the file half of a task: resolve sources, apply the pipeline, write
/// every resulting buffer under the destination.
///
/// A task without sources is an aggregate (or command-only) task and writes
/// nothing. Nothing is written if resolving or any transform fails. Writes
/// happen in buffer order; a failed write stops the task and leaves files
/// already written in place.
pub fn run_pipeline(
    fs: &dyn FileSystem,
    task: &TaskDescriptor,
    base_dir: &Path,
) -> Result<Vec<PathBuf>, TaskError> {
    if task.sources.is_empty() {
        debug!(task = %task.name, "no sources; nothing to write");
        return Ok(Vec::new());
    }

    let inputs = resolve(fs, &task.sources, base_dir, task.allow_empty)?;
    debug!(task = %task.name, files = inputs.len(), "sources resolved");

    let ctx = TransformContext::new(task.name.clone(), base_dir);
    let outputs = apply_pipeline(&task.pipeline, inputs, &ctx)?;

    let destination = base_dir.join(&task.destination);
    let written = outputs
        .iter()
        .map(|buffer| write(fs, buffer, &destination))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        task = %task.name,
        files = written.len(),
        dest = %destination.display(),
        "outputs written"
    );
    Ok(written)
}
