// src/transform/concat.rs

use camino::Utf8PathBuf;

use super::{Transform, TransformContext};
use crate::errors::TaskError;
use crate::types::FileBuffer;

/// Join all inputs, in order, into one buffer named `name`.
///
/// No inputs produce no output rather than an empty file.
#[derive(Debug, Clone)]
pub struct Concat {
    name: Utf8PathBuf,
    separator: Vec<u8>,
}

impl Concat {
    pub fn new(name: impl Into<Utf8PathBuf>, separator: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            separator: separator.into(),
        }
    }
}

impl Transform for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        _ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let total: usize = inputs.iter().map(|b| b.contents.len()).sum::<usize>()
            + self.separator.len() * (inputs.len() - 1);
        let mut joined = Vec::with_capacity(total);
        for (i, buffer) in inputs.iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(&self.separator);
            }
            joined.extend_from_slice(&buffer.contents);
        }

        Ok(vec![FileBuffer::new(self.name.clone(), joined)])
    }
}
