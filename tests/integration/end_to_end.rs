// tests/integration/end_to_end.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use builddag::cli::CliArgs;
use builddag::config::{ConfigFile, load_and_validate};
use builddag::dag::{SkipCause, TaskGraph, TaskRunState};
use builddag::engine::{BuildReport, BuildSettings, build, clean_then_build};
use builddag::errors::TaskError;
use builddag::fs::{FileSystem, RealFileSystem};
use builddag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const CONFIG: &str = r#"
[config]
default_target = "default"
jobs = 2

[[task]]
name = "styles"
sources = ["src/*.css", "vendor/bootstrap.css"]
pipeline = [{ concat = "styles.css" }, { rename = { suffix = ".min" } }, "minify-css"]

[[task]]
name = "html"
sources = ["*.html"]

[[task]]
name = "compress"
after = ["styles"]
sources = ["src/*.css"]
pipeline = ["gzip"]
dest = "dist/gz"

[[task]]
name = "default"
after = ["styles", "html", "compress"]
"#;

fn site(config: &str) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    fs::create_dir_all(root.join("src"))?;
    fs::create_dir_all(root.join("vendor"))?;
    fs::write(root.join("src/a.css"), "a {\n  color: red;\n}\n")?;
    fs::write(root.join("src/b.css"), "b {\n  margin: 0px;\n}\n")?;
    fs::write(root.join("vendor/bootstrap.css"), ".btn { padding: 4px; }\n")?;
    fs::write(root.join("index.html"), "<!doctype html>\n")?;
    fs::write(root.join("Builddag.toml"), config)?;
    Ok(dir)
}

fn setup(dir: &TempDir) -> Result<(ConfigFile, Arc<TaskGraph>, BuildSettings), Box<dyn Error>> {
    let cfg = load_and_validate(dir.path().join("Builddag.toml"))?;
    let graph = Arc::new(TaskGraph::from_config(&cfg)?);
    let settings = BuildSettings {
        jobs: cfg.config.jobs,
        fail_fast: cfg.config.fail_fast,
        base_dir: cfg.base_dir(),
        cancel_on_ctrl_c: false,
    };
    Ok((cfg, graph, settings))
}

fn real_fs() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

/// Every file below `dir` with its bytes, keyed by relative path.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    if dir.exists() {
        walk(dir, dir, &mut out);
    }
    out
}

async fn build_default(dir: &TempDir) -> Result<BuildReport, Box<dyn Error>> {
    let (_, graph, settings) = setup(dir)?;
    Ok(with_timeout(build(graph, "default", &settings, real_fs())).await?)
}

#[tokio::test]
async fn builds_the_whole_site() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;

    let report = build_default(&dir).await?;
    assert!(report.is_success(), "{report}");

    let dist = dir.path().join("dist");
    let css = fs::read_to_string(dist.join("styles.min.css"))?;
    assert!(css.starts_with("a{color:red}b{margin:0}"), "got {css}");
    assert!(!css.contains('\n'));
    assert_eq!(fs::read_to_string(dist.join("index.html"))?, "<!doctype html>\n");
    assert!(dist.join("gz/a.css.gz").is_file());
    assert!(dist.join("gz/b.css.gz").is_file());

    let written = report.into_result()?;
    assert_eq!(written.len(), 4);
    assert!(written.contains(&dist.join("styles.min.css")));
    Ok(())
}

#[tokio::test]
async fn clean_then_build_is_reproducible() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;
    let (cfg, graph, settings) = setup(&dir)?;
    let dist = cfg.output_dir();

    fs::create_dir_all(&dist)?;
    fs::write(dist.join("stale.js"), "old")?;

    let first = with_timeout(clean_then_build(
        Arc::clone(&graph),
        "default",
        &settings,
        real_fs(),
        &dist,
    ))
    .await?;
    assert!(first.is_success());
    assert!(!dist.join("stale.js").exists());
    let before = snapshot(&dist);

    let second =
        with_timeout(clean_then_build(graph, "default", &settings, real_fs(), &dist)).await?;
    assert!(second.is_success());
    assert_eq!(snapshot(&dist), before);
    Ok(())
}

#[tokio::test]
async fn building_a_leaf_only_runs_its_closure() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;
    let (_, graph, settings) = setup(&dir)?;

    let report = with_timeout(build(graph, "html", &settings, real_fs())).await?;

    assert_eq!(report.plan, ["html"]);
    let files = snapshot(&dir.path().join("dist"));
    assert_eq!(files.keys().collect::<Vec<_>>(), [&PathBuf::from("index.html")]);
    Ok(())
}

#[tokio::test]
async fn syntax_error_fails_task_and_skips_dependents() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;
    fs::write(dir.path().join("src/c.css"), "p { color: red }\ndiv[ {\n")?;

    let report = build_default(&dir).await?;

    assert_eq!(report.state_of("styles"), Some(TaskRunState::Failed));
    assert_eq!(report.state_of("html"), Some(TaskRunState::Succeeded));
    assert_eq!(
        report.task("compress").unwrap().skip_cause,
        Some(SkipCause::Upstream("styles".into()))
    );
    assert_eq!(report.state_of("default"), Some(TaskRunState::Skipped));

    let err = report.task("styles").unwrap().error.clone().unwrap();
    match err.as_ref() {
        // Reported against the bundle the minifier saw.
        TaskError::Syntax { location, .. } => assert_eq!(location.file, "styles.min.css"),
        other => panic!("expected syntax error, got {other:?}"),
    }
    assert!(!dir.path().join("dist/styles.min.css").exists());
    assert!(report.into_result().is_err());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn command_runs_before_the_pipeline_in_base_dir() -> TestResult {
    init_tracing();
    let dir = site(
        r#"
[[task]]
name = "version"
cmd = "mkdir -p gen && printf '1.2.3' > gen/version.txt"
sources = ["gen/*.txt"]
dest = "dist/meta"
"#,
    )?;
    let (_, graph, settings) = setup(&dir)?;

    let report = with_timeout(build(graph, "version", &settings, real_fs())).await?;

    assert!(report.is_success(), "{report}");
    assert_eq!(
        fs::read_to_string(dir.path().join("dist/meta/version.txt"))?,
        "1.2.3"
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_is_reported_with_exit_code() -> TestResult {
    init_tracing();
    let dir = site(
        r#"
[[task]]
name = "lint"
cmd = "echo 'lint: 2 problems' >&2; exit 3"

[[task]]
name = "html"
after = ["lint"]
sources = ["*.html"]
"#,
    )?;
    let (_, graph, settings) = setup(&dir)?;

    let report = with_timeout(build(graph, "html", &settings, real_fs())).await?;

    let lint = report.task("lint").unwrap();
    match lint.error.as_deref() {
        Some(TaskError::Command { code, stderr, .. }) => {
            assert_eq!(*code, Some(3));
            assert_eq!(stderr, "lint: 2 problems");
        }
        other => panic!("expected command error, got {other:?}"),
    }
    assert_eq!(report.state_of("html"), Some(TaskRunState::Skipped));
    assert!(!dir.path().join("dist").exists());
    Ok(())
}

fn cli_args(dir: &TempDir) -> CliArgs {
    CliArgs {
        target: None,
        config: dir.path().join("Builddag.toml").display().to_string(),
        clean: false,
        dry_run: false,
        jobs: None,
        fail_fast: false,
        log_level: None,
    }
}

#[tokio::test]
async fn cli_dry_run_writes_nothing() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;

    let args = CliArgs {
        dry_run: true,
        ..cli_args(&dir)
    };
    builddag::run(args).await?;

    assert!(!dir.path().join("dist").exists());
    Ok(())
}

#[tokio::test]
async fn cli_run_builds_default_target_and_reports_failures() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;

    let args = CliArgs {
        clean: true,
        ..cli_args(&dir)
    };
    builddag::run(args).await?;
    assert!(dir.path().join("dist/styles.min.css").is_file());

    fs::write(dir.path().join("src/c.css"), "div[ {")?;
    let err = builddag::run(cli_args(&dir)).await.unwrap_err();
    assert!(err.to_string().contains("styles"), "{err}");
    Ok(())
}

#[tokio::test]
async fn cli_rejects_unknown_target() -> TestResult {
    init_tracing();
    let dir = site(CONFIG)?;

    let args = CliArgs {
        target: Some("release".into()),
        ..cli_args(&dir)
    };
    let err = builddag::run(args).await.unwrap_err();
    assert!(err.to_string().contains("release"));
    assert!(!dir.path().join("dist").exists());
    Ok(())
}
