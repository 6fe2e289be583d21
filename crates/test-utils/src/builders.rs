#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use builddag::config::{
    ConcatSpec, ConfigFile, ConfigSection, RawConfigFile, RenameSpec, TaskConfig, ToolsSection,
    TransformSpec,
};
use builddag::dag::{TaskDescriptor, TaskGraph};
use builddag::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                tools: ToolsSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.base_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.output_dir = dir.into();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = jobs;
        self
    }

    pub fn fail_fast(mut self, val: bool) -> Self {
        self.config.config.fail_fast = val;
        self
    }

    pub fn default_target(mut self, name: &str) -> Self {
        self.config.config.default_target = Some(name.to_string());
        self
    }

    pub fn minify_js_tool(mut self, argv: &[&str]) -> Self {
        self.config.tools.minify_js = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The unvalidated config, for tests exercising validation itself.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                after: vec![],
                sources: vec![],
                allow_empty: false,
                pipeline: vec![],
                dest: None,
                cmd: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn source(mut self, pattern: &str) -> Self {
        self.task.sources.push(pattern.to_string());
        self
    }

    pub fn allow_empty(mut self, val: bool) -> Self {
        self.task.allow_empty = val;
        self
    }

    pub fn stage(mut self, spec: TransformSpec) -> Self {
        self.task.pipeline.push(spec);
        self
    }

    pub fn concat(self, name: &str) -> Self {
        self.stage(TransformSpec::Concat(ConcatSpec::Name(name.to_string())))
    }

    pub fn rename_suffix(self, suffix: &str) -> Self {
        self.stage(TransformSpec::Rename(RenameSpec {
            suffix: Some(suffix.to_string()),
            ..RenameSpec::default()
        }))
    }

    pub fn dest(mut self, dir: &str) -> Self {
        self.task.dest = Some(PathBuf::from(dir));
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Graph of pipeline-less tasks from `(name, prerequisites)` pairs.
pub fn graph(spec: &[(&str, &[&str])]) -> Arc<TaskGraph> {
    Arc::new(try_graph(spec).expect("Failed to build valid graph"))
}

pub fn try_graph(spec: &[(&str, &[&str])]) -> Result<TaskGraph> {
    let tasks = spec
        .iter()
        .map(|(name, deps)| {
            deps.iter()
                .fold(TaskDescriptor::new(*name), |task, dep| task.after(*dep))
        })
        .collect();
    TaskGraph::new(tasks)
}
