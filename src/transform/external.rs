// src/transform/external.rs

//! Blocking invocation of external tools (JS minifier, DSL compiler).
//!
//! Pipelines run on Tokio's blocking pool, so a plain
//! `std::process::Command` is fine here.

use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::errors::TaskError;

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run `argv`, optionally feeding `stdin`, and capture both output streams.
///
/// A non-zero exit is not an error at this level; callers turn it into the
/// diagnostic that fits their stage.
pub fn run_tool(
    argv: &[String],
    cwd: Option<&Path>,
    stdin: Option<&[u8]>,
) -> Result<ToolOutput, TaskError> {
    let (program, args) = argv.split_first().ok_or_else(|| TaskError::Tool {
        tool: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
    })?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(tool = %program, ?args, "running external tool");

    let tool_error = |source: std::io::Error| TaskError::Tool {
        tool: program.clone(),
        source,
    };

    let mut child = cmd.spawn().map_err(tool_error)?;
    let pipe = child.stdin.take();

    // Feed stdin from a second thread so a tool that writes a lot before
    // draining its input cannot deadlock us.
    let output = std::thread::scope(|scope| {
        if let (Some(mut pipe), Some(data)) = (pipe, stdin) {
            scope.spawn(move || {
                // A tool that exits early closes the pipe; its exit status
                // tells the real story.
                let _ = pipe.write_all(data);
            });
        }
        child.wait_with_output()
    })
    .map_err(tool_error)?;

    Ok(ToolOutput {
        status: output.status,
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// First non-empty line of `text`, trimmed.
pub fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("tool failed without diagnostics")
        .to_string()
}
