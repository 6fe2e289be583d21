// src/transform/rename.rs

use camino::{Utf8Path, Utf8PathBuf};

use super::{map_each, Transform, TransformContext};
use crate::config::model::RenameSpec;
use crate::errors::TaskError;
use crate::types::FileBuffer;

/// Rewrite logical paths as `dirname/prefix + basename + suffix + extname`.
///
/// With only `suffix = ".min"`, `styles.css` becomes `styles.min.css`.
#[derive(Debug, Clone)]
pub struct Rename {
    spec: RenameSpec,
}

impl Rename {
    pub fn new(spec: RenameSpec) -> Self {
        Self { spec }
    }

    /// Shorthand for the common `{ suffix = ... }` form.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::new(RenameSpec {
            suffix: Some(suffix.into()),
            ..RenameSpec::default()
        })
    }

    pub fn rename_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        let dirname = match &self.spec.dirname {
            Some(dir) => Utf8PathBuf::from(dir),
            None => path.parent().map(Utf8Path::to_path_buf).unwrap_or_default(),
        };
        let stem = self
            .spec
            .basename
            .as_deref()
            .or_else(|| path.file_stem())
            .unwrap_or_default();
        let extname = match &self.spec.extname {
            Some(ext) => ext.clone(),
            None => path.extension().map(|e| format!(".{e}")).unwrap_or_default(),
        };

        let file_name = format!(
            "{}{}{}{}",
            self.spec.prefix.as_deref().unwrap_or_default(),
            stem,
            self.spec.suffix.as_deref().unwrap_or_default(),
            extname
        );
        dirname.join(file_name)
    }
}

impl Transform for Rename {
    fn name(&self) -> &str {
        "rename"
    }

    fn apply(
        &self,
        inputs: Vec<FileBuffer>,
        _ctx: &TransformContext,
    ) -> Result<Vec<FileBuffer>, TaskError> {
        map_each(inputs, |buffer| {
            let path = self.rename_path(&buffer.path);
            Ok(buffer.renamed(path))
        })
    }
}
