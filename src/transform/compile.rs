// src/transform/compile.rs

//! DSL-to-JavaScript compilation through an external compiler.
//!
//! The compiler is invoked once per pipeline with every entry module and
//! writes into a scratch directory; the produced script becomes a single
//! buffer. Failures are reported with the file/line/column the compiler
//! pointed at, read from Elm's `--report=json` output when available and
//! from a `file:line:col` prefix otherwise.

use std::path::Path;
use std::sync::LazyLock;

use camino::Utf8PathBuf;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::external::{first_line, run_tool};
use super::{Transform, TransformContext};
use crate::errors::{SourceLocation, TaskError};
use crate::types::FileBuffer;

#[derive(Debug, Clone)]
pub struct CompileToJs {
    argv: Vec<String>,
    entry: Option<String>,
    output: Utf8PathBuf,
}

impl CompileToJs {
    pub fn new(argv: Vec<String>, entry: Option<String>, output: impl Into<Utf8PathBuf>) -> Self {
        Self {
            argv,
            entry,
            output: output.into(),
        }
    }

    fn expand_argv(&self, entries: &[String], output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        let mut argv = Vec::with_capacity(self.argv.len() + entries.len());
        for arg in &self.argv {
            if arg == "{entries}" {
                argv.extend(entries.iter().cloned());
            } else {
                argv.push(arg.replace("{output}", &output));
            }
        }
        argv
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ElmReport {
    CompileErrors {
        errors: Vec<ElmModuleErrors>,
    },
    Error {
        #[serde(default)]
        path: Option<String>,
        title: String,
        #[serde(default)]
        message: Vec<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct ElmModuleErrors {
    path: String,
    problems: Vec<ElmProblem>,
}

#[derive(Debug, Deserialize)]
struct ElmProblem {
    title: String,
    region: ElmRegion,
    #[serde(default)]
    message: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ElmRegion {
    start: ElmPosition,
}

#[derive(Debug, Deserialize)]
struct ElmPosition {
    line: u32,
    column: u32,
}

/// Elm messages mix plain strings with styled `{ "string": ... }` chunks.
fn render_message(chunks: &[Value]) -> String {
    let text: String = chunks
        .iter()
        .filter_map(|chunk| match chunk {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("string").and_then(Value::as_str),
            _ => None,
        })
        .collect();
    text.trim().to_string()
}

fn from_elm_report(stderr: &str) -> Option<(SourceLocation, String)> {
    let report: ElmReport = serde_json::from_str(stderr.trim()).ok()?;
    match report {
        ElmReport::CompileErrors { errors } => {
            let module = errors.into_iter().next()?;
            let problem = module.problems.into_iter().next()?;
            let detail = render_message(&problem.message);
            let message = if detail.is_empty() {
                problem.title
            } else {
                format!("{}: {}", problem.title, detail)
            };
            Some((
                SourceLocation::new(module.path, problem.region.start.line, problem.region.start.column),
                message,
            ))
        }
        ElmReport::Error {
            path,
            title,
            message,
        } => {
            let detail = render_message(&message);
            let location = SourceLocation::file_only(path.unwrap_or_default());
            Some((location, format!("{title}: {detail}")))
        }
    }
}

/// `file:line:col: message`, as printed by most compilers.
static PLAIN_DIAGNOSTIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([^\s:]+):(\d+):(\d+):?\s*(.*)$").expect("literal regex")
});

fn from_plain_diagnostic(stderr: &str) -> Option<(SourceLocation, String)> {
    let caps = PLAIN_DIAGNOSTIC_RE.captures(stderr)?;
    let location = SourceLocation::new(&caps[1], caps[2].parse().ok()?, caps[3].parse().ok()?);
    let message = match caps[4].trim() {
        "" => first_line(&stderr[caps.get(0)?.end()..]),
        rest => rest.to_string(),
    };
    Some((location, message))
}

/// Build the error for a failed compiler run.
pub fn diagnose(stderr: &str, fallback_file: &str) -> TaskError {
    let (location, message) = from_elm_report(stderr)
        .or_else(|| from_plain_diagnostic(stderr))
        .unwrap_or_else(|| (SourceLocation::file_only(fallback_file), first_line(stderr)));
    TaskError::Compile { location, message }
}

impl Transform for CompileToJs {
    fn name(&self) -> &str {
        "compile-to-js"
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        let entries: Vec<String> = match &self.entry {
            Some(entry) => vec![entry.clone()],
            None => inputs.iter().map(FileBuffer::display_name).collect(),
        };
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::Builder::new()
            .prefix("builddag-compile-")
            .tempdir()
            .map_err(|source| TaskError::io(std::env::temp_dir(), source))?;
        let file_name = self.output.file_name().unwrap_or("out.js");
        let out_file = scratch.path().join(file_name);

        let argv = self.expand_argv(&entries, &out_file);
        debug!(task = %ctx.task, ?entries, "compiling to JavaScript");

        let output = run_tool(&argv, Some(&ctx.base_dir), None)?;
        if !output.status.success() {
            return Err(diagnose(&output.stderr, &entries[0]));
        }

        let contents =
            std::fs::read(&out_file).map_err(|source| TaskError::io(&out_file, source))?;
        let mut buffer = FileBuffer::new(self.output.clone(), contents);
        if self.entry.is_some() || inputs.len() == 1 {
            buffer.origin = Some(ctx.base_dir.join(&entries[0]));
        }
        Ok(vec![buffer])
    }
}
