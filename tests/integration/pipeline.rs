// tests/integration/pipeline.rs

use std::path::{Path, PathBuf};

use builddag::dag::TaskDescriptor;
use builddag::errors::TaskError;
use builddag::exec::run_pipeline;
use builddag::fs::FileSystem;
use builddag::fs::mock::MockFileSystem;
use builddag::transform::{Concat, Gzip, MinifyCss, Rename};

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/a.css", "a { color: red; }");
    fs.add_file("/proj/src/b.css", "b { color: blue; }");
    fs.add_file("/proj/bower_components/bootstrap/dist/css/bootstrap.css", ".btn { padding: 0 }");
    fs.add_file("/proj/index.html", "<html></html>");
    fs
}

#[test]
fn styles_task_writes_one_minified_bundle() {
    let fs = project();
    let task = TaskDescriptor::new("styles")
        .source("src/*.css")
        .source("bower_components/bootstrap/dist/css/bootstrap.css")
        .pipe(Concat::new("styles.css", ""))
        .pipe(Rename::suffix(".min"))
        .pipe(MinifyCss)
        .dest("dist");

    let written = run_pipeline(&fs, &task, Path::new("/proj")).unwrap();

    assert_eq!(written, [PathBuf::from("/proj/dist/styles.min.css")]);
    let text = String::from_utf8(fs.contents("/proj/dist/styles.min.css").unwrap()).unwrap();
    assert!(text.starts_with("a{color:red}b{color:"), "got {text}");
    assert!(text.ends_with(".btn{padding:0}"), "got {text}");
}

#[test]
fn copy_task_keeps_paths_relative_to_glob_base() {
    let fs = project();
    let task = TaskDescriptor::new("html").source("*.html").dest("dist");

    let written = run_pipeline(&fs, &task, Path::new("/proj")).unwrap();

    assert_eq!(written, [PathBuf::from("/proj/dist/index.html")]);
    assert_eq!(fs.contents("/proj/dist/index.html").unwrap(), b"<html></html>");
}

#[test]
fn gzip_stage_writes_gz_files() {
    let fs = project();
    let task = TaskDescriptor::new("compress")
        .source("src/*.css")
        .pipe(Gzip)
        .dest("dist/gz");

    let written = run_pipeline(&fs, &task, Path::new("/proj")).unwrap();

    assert_eq!(
        written,
        [
            PathBuf::from("/proj/dist/gz/a.css.gz"),
            PathBuf::from("/proj/dist/gz/b.css.gz"),
        ]
    );
}

#[test]
fn failing_stage_writes_nothing() {
    let fs = project();
    fs.add_file("/proj/src/z.css", "div[ {");
    let task = TaskDescriptor::new("styles")
        .source("src/*.css")
        .pipe(MinifyCss)
        .dest("dist");

    let err = run_pipeline(&fs, &task, Path::new("/proj")).unwrap_err();

    assert!(matches!(err, TaskError::Syntax { .. }));
    assert!(!fs.exists(Path::new("/proj/dist")));
}

#[test]
fn failed_write_stops_at_the_offending_file() {
    let fs = project();
    // A directory squatting on the second output path.
    fs.create_dir_all(Path::new("/proj/dist/b.css")).unwrap();
    let task = TaskDescriptor::new("copy").source("src/*.css").dest("dist");

    let err = run_pipeline(&fs, &task, Path::new("/proj")).unwrap_err();

    match err {
        TaskError::Io { path, .. } => assert_eq!(path, PathBuf::from("/proj/dist/b.css")),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert_eq!(fs.contents("/proj/dist/a.css").unwrap(), b"a { color: red; }");
}

#[test]
fn task_without_sources_is_an_aggregate() {
    let fs = project();
    let task = TaskDescriptor::new("default").after("styles");

    let written = run_pipeline(&fs, &task, Path::new("/proj")).unwrap();
    assert!(written.is_empty());
}

#[test]
fn missing_sources_fail_the_task() {
    let fs = project();
    let task = TaskDescriptor::new("scripts").source("src/*.js").dest("dist");

    let err = run_pipeline(&fs, &task, Path::new("/proj")).unwrap_err();
    assert!(matches!(err, TaskError::NoMatch { pattern } if pattern == "src/*.js"));

    let task = TaskDescriptor::new("scripts")
        .source("src/*.js")
        .allow_empty(true)
        .pipe(Concat::new("bundle.js", ""));
    let written = run_pipeline(&fs, &task, Path::new("/proj")).unwrap();
    assert!(written.is_empty());
}
