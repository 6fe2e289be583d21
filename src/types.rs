// src/types.rs

//! Value types shared between the resolver, transforms and writer.

use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;

/// One file flowing through a task's pipeline.
///
/// `path` is the logical output path, relative to the task destination and
/// always `/`-separated. `origin` remembers where the bytes were read from,
/// which is only used for diagnostics and for tools that need real files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBuffer {
    pub path: Utf8PathBuf,
    pub origin: Option<PathBuf>,
    pub contents: Vec<u8>,
}

impl FileBuffer {
    pub fn new(path: impl Into<Utf8PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            origin: None,
            contents: contents.into(),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Same origin, new logical path.
    pub fn renamed(self, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..self
        }
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Name used when reporting errors about this buffer.
    pub fn display_name(&self) -> String {
        match &self.origin {
            Some(origin) => origin.display().to_string(),
            None => self.path.to_string(),
        }
    }
}
