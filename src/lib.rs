// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod files;
pub mod fs;
pub mod logging;
pub mod transform;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::TaskGraph;
use crate::engine::{BuildSettings, build, clean_then_build};
use crate::errors::BuilddagError;
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - target selection
/// - graph construction
/// - the build (optionally preceded by clean)
/// - the final summary
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let target = args
        .target
        .clone()
        .or_else(|| cfg.config.default_target.clone())
        .ok_or(BuilddagError::NoTarget)?;

    let graph = Arc::new(TaskGraph::from_config(&cfg)?);

    if args.dry_run {
        print_dry_run(&cfg, &graph, &target)?;
        return Ok(());
    }

    let settings = BuildSettings {
        jobs: args.jobs.unwrap_or(cfg.config.jobs),
        fail_fast: args.fail_fast || cfg.config.fail_fast,
        base_dir: cfg.base_dir(),
        cancel_on_ctrl_c: true,
    };
    info!(target_task = %target, jobs = settings.jobs, "building");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let report = if args.clean || cfg.config.clean {
        clean_then_build(graph, &target, &settings, fs, &cfg.output_dir()).await?
    } else {
        build(graph, &target, &settings, fs).await?
    };

    print!("{report}");
    let written = report.into_result()?;
    debug!(files = written.len(), "build succeeded");
    Ok(())
}

/// Dry-run output: the plan for `target` with each task's inputs and stages.
fn print_dry_run(cfg: &ConfigFile, graph: &TaskGraph, target: &str) -> Result<()> {
    let plan = graph.plan(target)?;

    println!("builddag dry-run");
    println!("  base_dir = {}", cfg.base_dir().display());
    println!("  output_dir = {}", cfg.output_dir().display());
    println!("  jobs = {}", cfg.config.jobs);
    println!();

    println!("plan for '{target}' ({} task(s)):", plan.len());
    for name in &plan {
        let Some(task) = graph.get(name) else {
            continue;
        };
        println!("  - {name}");
        if !task.prerequisites.is_empty() {
            println!("      after: {:?}", task.prerequisites);
        }
        if let Some(ref cmd) = task.cmd {
            println!("      cmd: {cmd}");
        }
        if !task.sources.is_empty() {
            println!("      sources: {:?}", task.sources);
            let stages: Vec<&str> = task.pipeline.iter().map(|t| t.name()).collect();
            if !stages.is_empty() {
                println!("      pipeline: {}", stages.join(" -> "));
            }
            println!("      dest: {}", task.destination.display());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
