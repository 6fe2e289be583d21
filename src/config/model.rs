// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Raw configuration exactly as deserialized from TOML.
///
/// ```toml
/// [config]
/// output_dir = "dist"
/// default_target = "default"
///
/// [[task]]
/// name = "styles"
/// sources = ["src/*.css"]
/// pipeline = [{ concat = "styles.css" }, { rename = { suffix = ".min" } }, "minify-css"]
///
/// [[task]]
/// name = "default"
/// after = ["styles"]
/// ```
///
/// Tasks are an array of tables so declaration order survives parsing; that
/// order breaks ties in the build plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub tools: ToolsSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub tools: ToolsSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        tools: ToolsSection,
        task: Vec<TaskConfig>,
    ) -> Self {
        Self { config, tools, task }
    }

    /// Directory that source patterns and destinations are relative to.
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Absolute-or-base-relative output directory (the `clean` target).
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir().join(&self.config.output_dir)
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.iter().find(|t| t.name == name)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Root for source patterns. Relative values are resolved against the
    /// config file's directory; when absent, that directory is used.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Default destination for tasks without `dest`, and the directory
    /// removed by `clean`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of tasks running at once.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Stop dispatching new tasks after the first failure.
    #[serde(default)]
    pub fail_fast: bool,

    /// Always clean `output_dir` before building.
    #[serde(default)]
    pub clean: bool,

    /// Task built when no target is given on the command line.
    #[serde(default)]
    pub default_target: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_jobs() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            base_dir: None,
            output_dir: default_output_dir(),
            jobs: default_jobs(),
            fail_fast: false,
            clean: false,
            default_target: None,
        }
    }
}

/// `[tools]` section: command lines of external collaborators.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    /// JS minifier; reads the script on stdin and writes the result to stdout.
    #[serde(default = "default_minify_js")]
    pub minify_js: Vec<String>,

    /// DSL compiler. `{entries}` expands to the entry files as separate
    /// arguments; `{output}` is replaced with the output file path.
    #[serde(default = "default_compile_to_js")]
    pub compile_to_js: Vec<String>,
}

fn default_minify_js() -> Vec<String> {
    ["esbuild", "--minify", "--loader=js", "--log-level=error"]
        .map(String::from)
        .to_vec()
}

fn default_compile_to_js() -> Vec<String> {
    ["elm", "make", "{entries}", "--output={output}", "--report=json"]
        .map(String::from)
        .to_vec()
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            minify_js: default_minify_js(),
            compile_to_js: default_compile_to_js(),
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,

    /// Prerequisite tasks; all must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// Ordered glob patterns; `!pattern` excludes.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Treat a pattern matching nothing as an empty set instead of an error.
    #[serde(default)]
    pub allow_empty: bool,

    #[serde(default)]
    pub pipeline: Vec<TransformSpec>,

    /// Destination directory; defaults to `[config].output_dir`.
    #[serde(default)]
    pub dest: Option<PathBuf>,

    /// Shell command run before the file pipeline.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl TaskConfig {
    /// Destination relative to the base directory.
    pub fn effective_dest<'a>(&'a self, output_dir: &'a Path) -> &'a Path {
        self.dest.as_deref().unwrap_or(output_dir)
    }
}

/// A pipeline stage as written in the config.
///
/// Unit stages are plain strings (`"minify-css"`), the others single-key
/// tables (`{ concat = "bundle.js" }`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformSpec {
    Concat(ConcatSpec),
    Rename(RenameSpec),
    MinifyCss,
    MinifyJs,
    CompileToJs(CompileSpec),
    Gzip,
}

impl TransformSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformSpec::Concat(_) => "concat",
            TransformSpec::Rename(_) => "rename",
            TransformSpec::MinifyCss => "minify-css",
            TransformSpec::MinifyJs => "minify-js",
            TransformSpec::CompileToJs(_) => "compile-to-js",
            TransformSpec::Gzip => "gzip",
        }
    }
}

/// `concat = "name"` or `concat = { name = "...", separator = "\n" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConcatSpec {
    Name(String),
    Options {
        name: String,
        #[serde(default)]
        separator: Option<String>,
    },
}

impl ConcatSpec {
    pub fn name(&self) -> &str {
        match self {
            ConcatSpec::Name(name) | ConcatSpec::Options { name, .. } => name,
        }
    }

    pub fn separator(&self) -> &str {
        match self {
            ConcatSpec::Options {
                separator: Some(sep),
                ..
            } => sep,
            _ => "",
        }
    }
}

/// Path rewrite options; any combination may be set.
///
/// `basename` excludes the extension and `extname` includes the dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameSpec {
    #[serde(default)]
    pub dirname: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub basename: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub extname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileSpec {
    /// Entry module; when absent every input file is passed to the compiler.
    #[serde(default)]
    pub entry: Option<String>,
    /// Logical path of the produced script.
    pub output: String,
}
