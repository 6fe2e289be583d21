// tests/integration/runtime_fake_executor.rs

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, sleep, timeout};

use builddag::dag::{Scheduler, SkipCause, TaskGraph, TaskRunState};
use builddag::engine::{
    BuildReport, CoreCommand, CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TaskOutcome,
};
use builddag::errors::BuilddagError;
use builddag::exec::ExecutorBackend;
use builddag_test_utils::{FakeExecutor, ManualExecutor, fake_failure, graph, init_tracing};

type BoxError = Box<dyn Error + Send + Sync>;
type TestResult = Result<(), BoxError>;

/// Mirrors a typical asset build: three leaves joined by `default`.
fn site_graph() -> Arc<TaskGraph> {
    graph(&[
        ("scripts", &[]),
        ("styles", &[]),
        ("html", &[]),
        ("default", &["scripts", "styles", "html"]),
        ("unrelated", &[]),
    ])
}

async fn run_with<E: ExecutorBackend>(
    graph: Arc<TaskGraph>,
    target: &str,
    jobs: usize,
    fail_fast: bool,
    rt_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
) -> Result<BuildReport, BoxError> {
    let scheduler = Scheduler::new(graph, target, jobs)?;
    let core = CoreRuntime::new(scheduler, RuntimeOptions { fail_fast });
    let runtime = Runtime::new(core, rt_rx, executor);

    // Enforce an upper bound on how long this test may run.
    match timeout(Duration::from_secs(3), runtime.run()).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err("runtime did not finish within 3 seconds".into()),
    }
}

async fn run_fake(
    graph: Arc<TaskGraph>,
    target: &str,
    jobs: usize,
    fail_fast: bool,
    failing: &[&str],
) -> Result<(BuildReport, Vec<String>), BoxError> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx, executed.clone()).failing(failing);

    let report = run_with(graph, target, jobs, fail_fast, rt_rx, executor).await?;
    let executed = executed.lock().unwrap().clone();
    Ok((report, executed))
}

#[tokio::test]
async fn runs_target_closure_in_plan_order() -> TestResult {
    init_tracing();

    let (report, executed) = run_fake(site_graph(), "default", 1, false, &[]).await?;

    assert_eq!(executed, ["scripts", "styles", "html", "default"]);
    assert_eq!(report.plan, executed);
    assert_eq!(report.dispatch_order, executed);
    assert!(report.is_success());
    assert!(report.task("unrelated").is_none());

    let written = report.into_result()?;
    assert_eq!(written.len(), 4);
    Ok(())
}

#[tokio::test]
async fn runs_are_repeatable() -> TestResult {
    init_tracing();

    let (_, first) = run_fake(site_graph(), "default", 3, false, &[]).await?;
    let (_, second) = run_fake(site_graph(), "default", 3, false, &[]).await?;

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn failure_skips_dependents_but_not_independent_branches() -> TestResult {
    init_tracing();

    let (report, executed) = run_fake(site_graph(), "default", 1, false, &["scripts"]).await?;

    assert_eq!(executed, ["scripts", "styles", "html"]);
    assert_eq!(report.state_of("scripts"), Some(TaskRunState::Failed));
    assert_eq!(report.state_of("styles"), Some(TaskRunState::Succeeded));
    assert_eq!(report.state_of("html"), Some(TaskRunState::Succeeded));
    assert_eq!(report.state_of("default"), Some(TaskRunState::Skipped));

    let default = report.task("default").unwrap();
    assert_eq!(default.skip_cause, Some(SkipCause::Upstream("scripts".into())));
    let scripts = report.task("scripts").unwrap();
    assert_eq!(
        scripts.error.as_ref().map(|e| e.to_string()),
        Some(fake_failure("scripts").to_string())
    );
    assert!(!report.cancelled);

    match report.into_result() {
        Err(BuilddagError::BuildFailed { failed, skipped }) => {
            assert_eq!(failed, ["scripts"]);
            assert_eq!(skipped, ["default"]);
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn failure_propagates_transitively() -> TestResult {
    init_tracing();

    let chain = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &["c"])]);
    let (report, executed) = run_fake(chain, "d", 2, false, &["a"]).await?;

    assert_eq!(executed, ["a"]);
    for name in ["b", "c", "d"] {
        let task = report.task(name).unwrap();
        assert_eq!(task.state, TaskRunState::Skipped);
        assert_eq!(task.skip_cause, Some(SkipCause::Upstream("a".into())));
    }
    Ok(())
}

#[tokio::test]
async fn fail_fast_cancels_everything_still_pending() -> TestResult {
    init_tracing();

    let (report, executed) = run_fake(site_graph(), "default", 1, true, &["scripts"]).await?;

    assert_eq!(executed, ["scripts"]);
    assert!(report.cancelled);
    assert_eq!(report.task("styles").unwrap().skip_cause, Some(SkipCause::Cancelled));
    assert_eq!(report.task("html").unwrap().skip_cause, Some(SkipCause::Cancelled));
    assert_eq!(
        report.task("default").unwrap().skip_cause,
        Some(SkipCause::Upstream("scripts".into()))
    );
    Ok(())
}

#[tokio::test]
async fn unknown_target_fails_before_anything_runs() -> TestResult {
    init_tracing();

    let result = Scheduler::new(site_graph(), "release", 1);
    assert!(matches!(result, Err(BuilddagError::UnknownTarget(name)) if name == "release"));
    Ok(())
}

#[tokio::test]
async fn concurrency_never_exceeds_jobs() -> TestResult {
    init_tracing();

    let wide = graph(&[
        ("a", &[]),
        ("b", &[]),
        ("c", &[]),
        ("d", &[]),
        ("all", &["a", "b", "c", "d"]),
    ]);
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let (executor, mut dispatched) = ManualExecutor::channel();

    let run = tokio::spawn(run_with(wide, "all", 2, false, rt_rx, executor));

    let mut order = Vec::new();
    let mut running = Vec::new();
    for _ in 0..2 {
        running.push(dispatched.recv().await.ok_or("executor channel closed")?.name);
    }

    while let Some(done) = running.first().cloned() {
        // No third task may show up while two are running.
        sleep(Duration::from_millis(20)).await;
        if running.len() == 2 {
            assert!(dispatched.try_recv().is_err(), "more than 2 tasks running");
        }

        running.remove(0);
        order.push(done.clone());
        rt_tx
            .send(RuntimeEvent::TaskCompleted {
                task: done,
                outcome: TaskOutcome::Success(Vec::new()),
            })
            .await?;

        if order.len() < 5 {
            if let Ok(Some(next)) = timeout(Duration::from_millis(200), dispatched.recv()).await {
                running.push(next.name);
            }
        }
    }

    let report = run.await??;
    assert_eq!(order, ["a", "b", "c", "d", "all"]);
    assert!(report.is_success());
    Ok(())
}

#[tokio::test]
async fn cancel_lets_running_tasks_finish_and_skips_the_rest() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let (executor, mut dispatched) = ManualExecutor::channel();

    let run = tokio::spawn(run_with(site_graph(), "default", 1, false, rt_rx, executor));

    let first = dispatched.recv().await.ok_or("executor channel closed")?;
    assert_eq!(first.name, "scripts");

    rt_tx.send(RuntimeEvent::CancelRequested).await?;
    rt_tx
        .send(RuntimeEvent::TaskCompleted {
            task: first.name.clone(),
            outcome: TaskOutcome::Success(Vec::new()),
        })
        .await?;

    let report = run.await??;

    assert!(report.cancelled);
    assert_eq!(report.dispatch_order, ["scripts"]);
    assert_eq!(report.state_of("scripts"), Some(TaskRunState::Succeeded));
    for name in ["styles", "html", "default"] {
        assert_eq!(report.task(name).unwrap().skip_cause, Some(SkipCause::Cancelled));
    }
    assert!(dispatched.try_recv().is_err());
    assert!(report.into_result().is_err());
    Ok(())
}

#[test]
fn stale_completions_are_ignored() {
    init_tracing();

    let mut scheduler = Scheduler::new(graph(&[("a", &[]), ("b", &["a"])]), "b", 1).unwrap();
    let started = scheduler.start();
    assert_eq!(started.len(), 1);

    // `b` has not been dispatched yet.
    let step = scheduler.step_completion("b", TaskOutcome::Success(Vec::new()));
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.run_state_of("b"), Some(TaskRunState::Pending));

    let ready = scheduler.handle_completion("a", TaskOutcome::Success(Vec::new()));
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, "b");

    // A second completion for `a` changes nothing.
    let step = scheduler.step_completion("a", TaskOutcome::failed(fake_failure("a")));
    assert!(step.newly_failed.is_empty());
    assert_eq!(scheduler.run_state_of("a"), Some(TaskRunState::Succeeded));
}

#[test]
fn manual_steps_report_what_changed() {
    init_tracing();

    let mut scheduler =
        Scheduler::new(graph(&[("a", &[]), ("b", &[]), ("c", &["a"])]), "c", 2).unwrap();

    let step = scheduler.step_start();
    let names: Vec<_> = step.newly_scheduled.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["a"]);
    assert!(!step.run_just_finished);

    // Starting twice dispatches nothing new.
    assert!(scheduler.step_start().newly_scheduled.is_empty());

    let step = scheduler.step_cancel();
    assert_eq!(step.newly_skipped, ["c"]);
    assert!(!step.run_just_finished);
    assert!(scheduler.is_cancelled());
    assert_eq!(scheduler.skip_cause_of("c"), Some(SkipCause::Cancelled));

    let step = scheduler.step_completion("a", TaskOutcome::Success(Vec::new()));
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
}

fn dispatched_names(commands: &[CoreCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => Some(tasks.iter().map(|t| t.name.clone())),
            CoreCommand::RequestExit => None,
        })
        .flatten()
        .collect()
}

#[test]
fn core_runtime_steps_through_a_build_without_io() {
    init_tracing();

    let scheduler = Scheduler::new(graph(&[("a", &[]), ("b", &["a"])]), "b", 1).unwrap();
    let mut core = CoreRuntime::new(scheduler, RuntimeOptions { fail_fast: false });

    let step = core.start();
    assert!(step.keep_running);
    assert_eq!(dispatched_names(&step.commands), ["a"]);

    let step = core.step(RuntimeEvent::TaskCompleted {
        task: "a".into(),
        outcome: TaskOutcome::Success(Vec::new()),
    });
    assert_eq!(dispatched_names(&step.commands), ["b"]);
    assert!(!core.is_finished());

    let step = core.step(RuntimeEvent::TaskCompleted {
        task: "b".into(),
        outcome: TaskOutcome::Success(Vec::new()),
    });
    assert!(!step.keep_running);
    assert!(matches!(step.commands.as_slice(), [CoreCommand::RequestExit]));
    assert!(core.is_finished());
    assert_eq!(core.scheduler().dispatch_order(), ["a", "b"]);
    assert!(core.report().into_result().is_ok());
}

#[test]
fn zero_jobs_is_rejected() {
    let result = Scheduler::new(graph(&[("a", &[])]), "a", 0);
    assert!(matches!(result, Err(BuilddagError::ConfigError(_))));
}
