// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `builddag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "builddag",
    version,
    about = "Build web assets from a declarative task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to build. Defaults to `[config].default_target`.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Builddag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Builddag.toml")]
    pub config: String,

    /// Remove the output directory before building.
    #[arg(long)]
    pub clean: bool,

    /// Parse + validate, print the plan, but don't execute any task.
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of tasks running at once (overrides `[config].jobs`).
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Stop dispatching new tasks after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
