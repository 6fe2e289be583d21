// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::graph::check_structure;
use crate::errors::{BuilddagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuilddagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.tools, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_graph(cfg)?;
    validate_default_target(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BuilddagError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.jobs == 0 {
        return Err(BuilddagError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.output_dir.as_os_str().is_empty() {
        return Err(BuilddagError::ConfigError(
            "[config].output_dir must not be empty".to_string(),
        ));
    }

    // `clean` removes output_dir recursively.
    if contains_base_dir(&cfg.config.output_dir) {
        return Err(BuilddagError::ConfigError(format!(
            "[config].output_dir '{}' would contain the project itself",
            cfg.config.output_dir.display()
        )));
    }

    for (key, argv) in [
        ("minify_js", &cfg.tools.minify_js),
        ("compile_to_js", &cfg.tools.compile_to_js),
    ] {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err(BuilddagError::ConfigError(format!(
                "[tools].{key} must name a program"
            )));
        }
    }

    Ok(())
}

/// True when `dir`, taken relative to the base directory, lexically names
/// the base directory, one of its ancestors, or a filesystem root.
fn contains_base_dir(dir: &Path) -> bool {
    let mut stack: Vec<Component<'_>> = Vec::new();
    for component in dir.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => stack.push(component),
            },
            other => stack.push(other),
        }
    }
    !stack.iter().any(|c| matches!(c, Component::Normal(_)))
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for task in cfg.task.iter() {
        if task.name.trim().is_empty() {
            return Err(BuilddagError::ConfigError(
                "every [[task]] needs a non-empty `name`".to_string(),
            ));
        }

        if !task.pipeline.is_empty() && task.sources.is_empty() {
            return Err(BuilddagError::ConfigError(format!(
                "task '{}' has a pipeline but no `sources`",
                task.name
            )));
        }

        if task.sources.iter().any(|p| p.trim().is_empty() || p == "!") {
            return Err(BuilddagError::ConfigError(format!(
                "task '{}' has an empty source pattern",
                task.name
            )));
        }
    }
    Ok(())
}

/// Duplicates, unknown `after` references and cycles.
fn validate_graph(cfg: &RawConfigFile) -> Result<()> {
    let edges: Vec<(&str, &[String])> = cfg
        .task
        .iter()
        .map(|t| (t.name.as_str(), t.after.as_slice()))
        .collect();
    check_structure(&edges)
}

fn validate_default_target(cfg: &RawConfigFile) -> Result<()> {
    if let Some(target) = &cfg.config.default_target {
        if !cfg.task.iter().any(|t| &t.name == target) {
            return Err(BuilddagError::UnknownTarget(target.clone()));
        }
    }
    Ok(())
}
