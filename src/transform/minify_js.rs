// src/transform/minify_js.rs

use std::sync::LazyLock;

use regex::Regex;

use super::external::{first_line, run_tool};
use super::{map_each, Transform, TransformContext};
use crate::errors::{SourceLocation, TaskError};
use crate::types::FileBuffer;

const NAME: &str = "minify-js";

static STDIN_POSITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<stdin>:(\d+):(\d+)").expect("literal regex"));

static ERROR_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ERROR\]\s*(.+)").expect("literal regex"));

/// Pipe each script through an external minifier (stdin to stdout).
#[derive(Debug, Clone)]
pub struct MinifyJs {
    argv: Vec<String>,
}

impl MinifyJs {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

/// `<stdin>:LINE:COL` as printed by esbuild-style diagnostics.
fn stdin_position(stderr: &str) -> Option<(u32, u32)> {
    let caps = STDIN_POSITION_RE.captures(stderr)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn error_message(stderr: &str) -> String {
    ERROR_LINE_RE
        .captures(stderr)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| first_line(stderr))
}

/// Turn a failed minifier run into a syntax error pointing into `buffer`.
pub fn diagnose(buffer: &FileBuffer, stderr: &str) -> TaskError {
    let location = match stdin_position(stderr) {
        Some((line, column)) => SourceLocation::new(buffer.display_name(), line, column),
        None => SourceLocation::file_only(buffer.display_name()),
    };
    TaskError::Syntax {
        transform: NAME.to_string(),
        location,
        message: error_message(stderr),
    }
}

impl Transform for MinifyJs {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        map_each(inputs, |buffer| {
            let output = run_tool(&self.argv, Some(&ctx.base_dir), Some(&buffer.contents))?;
            if !output.status.success() {
                return Err(diagnose(&buffer, &output.stderr));
            }
            Ok(FileBuffer {
                contents: output.stdout,
                ..buffer
            })
        })
    }
}
