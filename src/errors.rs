// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers:
//! - [`BuilddagError`] is fatal for a whole invocation: bad config, broken
//!   graph structure, or the final "build failed" verdict.
//! - [`TaskError`] is local to one task. It fails that task and skips its
//!   dependents, while independent branches keep going.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilddagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownTask { task: String, dependency: String },

    #[error("task '{0}' is defined more than once")]
    DuplicateTask(String),

    #[error("Cycle detected in DAG involving tasks: {}", tasks.join(", "))]
    DagCycle { tasks: Vec<String> },

    #[error("unknown target task '{0}'")]
    UnknownTarget(String),

    #[error("no target given and [config].default_target is not set")]
    NoTarget,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(
        "build failed: {} task(s) failed [{}], {} skipped",
        failed.len(),
        failed.join(", "),
        skipped.len()
    )]
    BuildFailed {
        failed: Vec<String>,
        skipped: Vec<String>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Position inside a source file that a transform or compiler complained
/// about. `line` and `column` are 1-based when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Location that only knows which file was involved.
    pub fn file_only(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        Ok(())
    }
}

/// Failure of a single task.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("pattern '{pattern}' matched no files")]
    NoMatch { pattern: String },

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{transform}: syntax error at {location}: {message}")]
    Syntax {
        transform: String,
        location: SourceLocation,
        message: String,
    },

    #[error("compile error at {location}: {message}")]
    Compile {
        location: SourceLocation,
        message: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not run tool '{tool}': {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{cmd}` failed (exit code {}): {stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Command {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuilddagError>;
