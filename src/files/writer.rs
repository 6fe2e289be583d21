// src/files/writer.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{Result, TaskError};
use crate::fs::FileSystem;
use crate::types::FileBuffer;

/// Persist `buffer` under `directory`, creating intermediate directories and
/// overwriting an existing file. Returns the written path.
pub fn write(
    fs: &dyn FileSystem,
    buffer: &FileBuffer,
    directory: &Path,
) -> std::result::Result<PathBuf, TaskError> {
    let target = directory.join(buffer.path.as_std_path());

    if let Some(parent) = target.parent() {
        fs.create_dir_all(parent)
            .map_err(|source| TaskError::io(parent, source))?;
    }
    fs.write(&target, &buffer.contents)
        .map_err(|source| TaskError::io(&target, source))?;

    debug!(path = %target.display(), bytes = buffer.contents.len(), "wrote file");
    Ok(target)
}

/// Remove `directory` and everything below it. Missing directories are fine.
pub fn clean(fs: &dyn FileSystem, directory: &Path) -> Result<()> {
    if !fs.exists(directory) {
        debug!(dir = %directory.display(), "clean: nothing to remove");
        return Ok(());
    }

    fs.remove_dir_all(directory)
        .with_context(|| format!("removing output directory {}", directory.display()))?;
    info!(dir = %directory.display(), "cleaned output directory");
    Ok(())
}
