// src/transform/gzip.rs

use std::io::Write;

use camino::Utf8PathBuf;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::{map_each, Transform, TransformContext};
use crate::errors::TaskError;
use crate::types::FileBuffer;

/// Wrap each buffer in a gzip envelope and append `.gz` to its path.
///
/// The header carries no timestamp or name, so equal inputs give equal
/// bytes across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip;

fn compress(contents: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents)?;
    encoder.finish()
}

impl Transform for Gzip {
    fn name(&self) -> &str {
        "gzip"
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        _ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        map_each(inputs, |buffer| {
            let compressed = compress(&buffer.contents)
                .map_err(|source| TaskError::io(buffer.display_name(), source))?;
            let path = Utf8PathBuf::from(format!("{}.gz", buffer.path));
            Ok(FileBuffer {
                path,
                contents: compressed,
                origin: buffer.origin,
            })
        })
    }
}
