// tests/integration/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use builddag::config::{ConcatSpec, TransformSpec, load_and_validate};
use builddag::errors::BuilddagError;
use builddag_test_utils::{ConfigFileBuilder, TaskConfigBuilder};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn parses_tasks_in_declaration_order_with_defaults() {
    let file = write_config(
        r#"
[config]
default_target = "default"

[[task]]
name = "styles"
sources = ["src/*.css", "!src/ignored.css"]
pipeline = [{ concat = "styles.css" }, { rename = { suffix = ".min" } }, "minify-css"]

[[task]]
name = "scripts"
sources = ["src/*.js"]
pipeline = [{ concat = { name = "bundle.js", separator = ";\n" } }, "minify-js", "gzip"]
dest = "dist/js"

[[task]]
name = "default"
after = ["styles", "scripts"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    let names: Vec<&str> = cfg.task.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["styles", "scripts", "default"]);
    assert_eq!(cfg.config.output_dir, PathBuf::from("dist"));
    assert_eq!(cfg.config.jobs, 1);
    assert!(!cfg.config.fail_fast);
    assert_eq!(cfg.config.default_target.as_deref(), Some("default"));

    let styles = cfg.task("styles").unwrap();
    assert_eq!(styles.pipeline.len(), 3);
    assert_eq!(
        styles.pipeline[0],
        TransformSpec::Concat(ConcatSpec::Name("styles.css".into()))
    );
    assert_eq!(styles.pipeline[2], TransformSpec::MinifyCss);

    let scripts = cfg.task("scripts").unwrap();
    match &scripts.pipeline[0] {
        TransformSpec::Concat(spec) => {
            assert_eq!(spec.name(), "bundle.js");
            assert_eq!(spec.separator(), ";\n");
        }
        other => panic!("expected concat, got {other:?}"),
    }
    assert_eq!(scripts.pipeline[2].kind(), "gzip");
    assert_eq!(
        scripts.effective_dest(&cfg.config.output_dir),
        PathBuf::from("dist/js")
    );
}

#[test]
fn base_dir_defaults_to_config_directory() {
    let file = write_config(
        r#"
[[task]]
name = "noop"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let dir = file.path().parent().unwrap();

    assert_eq!(cfg.base_dir(), dir);
    assert_eq!(cfg.output_dir(), dir.join("dist"));
}

#[test]
fn relative_base_dir_is_resolved_against_config_directory() {
    let file = write_config(
        r#"
[config]
base_dir = "site"
output_dir = "public"

[[task]]
name = "noop"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let dir = file.path().parent().unwrap();

    assert_eq!(cfg.base_dir(), dir.join("site"));
    assert_eq!(cfg.output_dir(), dir.join("site").join("public"));
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[[task]]
name = "A"
after = ["B"]

[[task]]
name = "B"
after = ["A"]

[[task]]
name = "C"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BuilddagError::DagCycle { tasks }) => assert_eq!(tasks, ["A", "B"]),
        Err(e) => panic!("Expected DagCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let result = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("loop").after("loop").build())
        .try_build();

    match result {
        Err(BuilddagError::DagCycle { tasks }) => assert_eq!(tasks, ["loop"]),
        other => panic!("Expected DagCycle error, got: {other:?}"),
    }
}

#[test]
fn unknown_dependency_is_reported_with_both_names() {
    let result = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("A").after("NonExistent").build())
        .try_build();

    match result {
        Err(BuilddagError::UnknownTask { task, dependency }) => {
            assert_eq!(task, "A");
            assert_eq!(dependency, "NonExistent");
        }
        other => panic!("Expected UnknownTask, got: {other:?}"),
    }
}

#[test]
fn duplicate_task_names_are_rejected() {
    let result = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("styles").build())
        .with_task(TaskConfigBuilder::new("styles").build())
        .try_build();

    assert!(matches!(result, Err(BuilddagError::DuplicateTask(name)) if name == "styles"));
}

#[test]
fn unknown_default_target_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("styles").build())
        .default_target("release")
        .try_build();

    assert!(matches!(result, Err(BuilddagError::UnknownTarget(name)) if name == "release"));
}

#[test]
fn pipeline_without_sources_is_a_config_error() {
    let result = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("styles").concat("styles.css").build())
        .try_build();

    match result {
        Err(BuilddagError::ConfigError(msg)) => {
            assert!(msg.contains("styles"));
            assert!(msg.contains("sources"));
        }
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn zero_jobs_is_a_config_error() {
    let result = ConfigFileBuilder::new()
        .jobs(0)
        .with_task(TaskConfigBuilder::new("A").build())
        .try_build();

    assert!(matches!(result, Err(BuilddagError::ConfigError(msg)) if msg.contains("jobs")));
}

#[test]
fn output_dir_covering_the_project_is_a_config_error() {
    for dir in [".", "./", "dist/..", "..", "../..", "/"] {
        let result = ConfigFileBuilder::new()
            .output_dir(dir)
            .with_task(TaskConfigBuilder::new("A").build())
            .try_build();
        assert!(
            matches!(&result, Err(BuilddagError::ConfigError(msg)) if msg.contains("output_dir")),
            "{dir:?} should be rejected, got {result:?}"
        );
    }

    for dir in ["dist", "./public", "../site-out", "build/../dist"] {
        let result = ConfigFileBuilder::new()
            .output_dir(dir)
            .with_task(TaskConfigBuilder::new("A").build())
            .try_build();
        assert!(result.is_ok(), "{dir:?} should be accepted, got {result:?}");
    }
}

#[test]
fn empty_task_list_is_a_config_error() {
    let result = ConfigFileBuilder::new().try_build();
    assert!(matches!(result, Err(BuilddagError::ConfigError(_))));
}

#[test]
fn unknown_fields_and_transforms_fail_to_parse() {
    let file = write_config(
        r#"
[[task]]
name = "A"
sources = ["*.css"]
pipeline = ["uglify"]
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuilddagError::TomlError(_))
    ));

    let file = write_config(
        r#"
[[task]]
name = "A"
watch = ["*.css"]
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(BuilddagError::TomlError(_))
    ));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Builddag.toml");
    assert!(matches!(result, Err(BuilddagError::IoError(_))));
}

#[test]
fn demo_config_plans_the_full_site_build() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/Builddag.toml");
    let cfg = load_and_validate(&path).unwrap();
    let graph = builddag::dag::TaskGraph::from_config(&cfg).unwrap();

    let plan = graph.plan("default").unwrap();
    assert_eq!(
        plan,
        ["styles", "elm-init", "elm", "scripts", "html", "compress", "default"]
    );
    assert_eq!(graph.plan("html").unwrap(), ["html"]);
    assert!(cfg.config.clean);
}
