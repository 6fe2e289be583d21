// src/transform/minify_css.rs

//! In-process CSS minification with `lightningcss`.

use lightningcss::error::ErrorLocation;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use super::{map_each, Transform, TransformContext};
use crate::errors::{SourceLocation, TaskError};
use crate::types::FileBuffer;

const NAME: &str = "minify-css";

#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyCss;

fn location(buffer: &FileBuffer, loc: Option<&ErrorLocation>) -> SourceLocation {
    match loc {
        // lightningcss lines are 0-based, columns 1-based.
        Some(loc) => SourceLocation::new(buffer.display_name(), loc.line + 1, loc.column),
        None => SourceLocation::file_only(buffer.display_name()),
    }
}

fn syntax_error(buffer: &FileBuffer, loc: Option<&ErrorLocation>, message: String) -> TaskError {
    TaskError::Syntax {
        transform: NAME.to_string(),
        location: location(buffer, loc),
        message,
    }
}

/// Parse and re-print `css` in minified form.
pub fn minify(buffer: &FileBuffer) -> Result<String, TaskError> {
    let source = std::str::from_utf8(&buffer.contents)
        .map_err(|e| syntax_error(buffer, None, format!("input is not valid UTF-8: {e}")))?;

    let options = ParserOptions {
        filename: buffer.path.to_string(),
        ..ParserOptions::default()
    };

    let mut sheet = StyleSheet::parse(source, options)
        .map_err(|e| syntax_error(buffer, e.loc.as_ref(), e.kind.to_string()))?;

    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| syntax_error(buffer, e.loc.as_ref(), e.kind.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| syntax_error(buffer, e.loc.as_ref(), e.kind.to_string()))?;

    Ok(printed.code)
}

impl Transform for MinifyCss {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        map_each(inputs, |buffer| {
            let code = minify(&buffer)?;
            tracing::debug!(
                task = %ctx.task,
                file = %buffer.path,
                before = buffer.contents.len(),
                after = code.len(),
                "minified stylesheet"
            );
            Ok(FileBuffer {
                contents: code.into_bytes(),
                ..buffer
            })
        })
    }
}
