// src/files/resolver.rs

//! Expand a task's ordered source patterns into file buffers.
//!
//! Ordering rules:
//! - patterns contribute their matches in declaration order;
//! - matches of a single pattern are sorted lexicographically;
//! - a file already produced by an earlier pattern is not repeated;
//! - `!pattern` entries remove matching files from the whole result.
//!
//! Each buffer's logical path is the file path relative to the pattern's
//! glob base (see [`glob_base`]). Patterns are cleaned first, so `./dist/*`
//! and `dist/*` select the same files and `../shared/*.css` reaches above
//! the base directory.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use camino::Utf8PathBuf;
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::errors::TaskError;
use crate::fs::FileSystem;
use crate::types::FileBuffer;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Leading directory of `pattern` that contains no glob metacharacters.
///
/// - `src/*.css` -> `src`
/// - `src/**/*.elm` -> `src`
/// - `vendor/a.css` -> `vendor` (a literal file's base is its directory)
/// - `*.html` -> `` (empty: relative to the base directory itself)
pub fn glob_base(pattern: &str) -> String {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal_prefix = parts
        .iter()
        .take_while(|part| !part.contains(GLOB_META))
        .count();

    // A fully literal pattern names a file; its base is the parent.
    let keep = if literal_prefix == parts.len() {
        parts.len().saturating_sub(1)
    } else {
        literal_prefix
    };

    let base = parts[..keep].join("/");
    if base.is_empty() && pattern.starts_with('/') {
        "/".to_string()
    } else {
        base
    }
}

/// Lexically clean a `/`-separated pattern.
///
/// `.` segments are dropped and `dir/..` pairs folded, so `./dist/*` becomes
/// `dist/*`. Leading `..` segments survive; their count is returned so the
/// walk can start that many levels above the base directory.
pub fn normalize_pattern(pattern: &str) -> (String, usize) {
    let absolute = pattern.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in pattern.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." && !last.contains(GLOB_META) => {
                    segments.pop();
                }
                None if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let ups = segments.iter().take_while(|s| **s == "..").count();
    let joined = segments.join("/");
    let cleaned = if absolute { format!("/{joined}") } else { joined };
    (cleaned, ups)
}

fn compile(pattern: &str) -> Result<Glob, TaskError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| TaskError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_exclusions(patterns: &[String]) -> Result<GlobSet, TaskError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder.build().map_err(|source| TaskError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Render `path` relative to `root` as a `/`-separated string.
fn relative_key(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// `base_dir` with `levels` trailing components removed.
fn ascend(base_dir: &Path, levels: usize) -> PathBuf {
    let mut root = base_dir.to_path_buf();
    for _ in 0..levels {
        if !root.pop() && !root.has_root() {
            root.push("..");
        }
    }
    root
}

/// Recursively collect every file at or below `start`.
fn walk_files(fs: &dyn FileSystem, start: &Path, out: &mut Vec<PathBuf>) -> Result<(), TaskError> {
    if fs.is_file(start) {
        out.push(start.to_path_buf());
        return Ok(());
    }
    if !fs.is_dir(start) {
        return Ok(());
    }
    let entries = fs
        .read_dir(start)
        .map_err(|source| TaskError::io(start, source))?;
    for entry in entries {
        walk_files(fs, &entry, out)?;
    }
    Ok(())
}

struct PositivePattern {
    /// Literal directory prefix of the cleaned pattern, leading `..` included.
    base: String,
    matcher: GlobMatcher,
    /// Number of leading `..` segments.
    ups: usize,
    absolute: bool,
}

impl PositivePattern {
    fn new(pattern: &str) -> Result<Self, TaskError> {
        let (cleaned, ups) = normalize_pattern(pattern);
        Ok(Self {
            base: glob_base(&cleaned),
            matcher: compile(&cleaned)?.compile_matcher(),
            ups,
            absolute: cleaned.starts_with('/'),
        })
    }

    /// Matching files as `(on-disk path, key relative to base_dir)`, sorted
    /// by key. Keys of files above `base_dir` start with `../`.
    fn matches(
        &self,
        fs: &dyn FileSystem,
        base_dir: &Path,
    ) -> Result<Vec<(PathBuf, String)>, TaskError> {
        let root = if self.absolute {
            PathBuf::from("/")
        } else {
            ascend(base_dir, self.ups)
        };
        let prefix = if self.absolute {
            "/".to_string()
        } else {
            "../".repeat(self.ups)
        };

        // The base already carries the `..` segments folded into `root`.
        let below_root = self
            .base
            .split('/')
            .skip(self.ups)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        let start = if below_root.is_empty() {
            root.clone()
        } else {
            root.join(&below_root)
        };

        let mut found = Vec::new();
        walk_files(fs, &start, &mut found)?;

        let mut matched: Vec<(PathBuf, String)> = found
            .into_iter()
            .filter_map(|path| {
                let key = format!("{prefix}{}", relative_key(&path, &root)?);
                self.matcher.is_match(&key).then_some((path, key))
            })
            .collect();
        matched.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(matched)
    }

    fn logical_path(&self, key: &str) -> Utf8PathBuf {
        let base = self.base.trim_end_matches('/');
        let stripped = if base.is_empty() {
            key
        } else {
            key.strip_prefix(base)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(key)
        };
        Utf8PathBuf::from(stripped)
    }
}

/// Resolve `patterns` (relative to `base_dir`) into an ordered list of
/// buffers.
///
/// Fails with [`TaskError::NoMatch`] when a positive pattern matches nothing,
/// unless `allow_empty` is set.
pub fn resolve(
    fs: &dyn FileSystem,
    patterns: &[String],
    base_dir: &Path,
    allow_empty: bool,
) -> Result<Vec<FileBuffer>, TaskError> {
    let (negated, positive): (Vec<&str>, Vec<&str>) = patterns
        .iter()
        .map(String::as_str)
        .partition(|p| p.starts_with('!'));

    let exclusions: Vec<String> = negated
        .iter()
        .map(|p| normalize_pattern(&p[1..]).0)
        .collect();
    let excluded = compile_exclusions(&exclusions)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut buffers = Vec::new();

    for pattern in positive {
        let positive = PositivePattern::new(pattern)?;
        let matches = positive.matches(fs, base_dir)?;
        trace!(pattern, count = matches.len(), "pattern expanded");

        if matches.is_empty() && !allow_empty {
            return Err(TaskError::NoMatch {
                pattern: pattern.to_string(),
            });
        }

        for (path, key) in matches {
            if excluded.is_match(&key) {
                debug!(file = %key, "excluded by negated pattern");
                continue;
            }
            if !seen.insert(key.clone()) {
                continue;
            }
            let contents = fs.read(&path).map_err(|source| TaskError::io(&path, source))?;
            buffers.push(FileBuffer::new(positive.logical_path(&key), contents).with_origin(path));
        }
    }

    Ok(buffers)
}
