// tests/basics.rs

mod common;

use common::{init_tracing, ms, noop_job, Recorder};

use jobdag::{AbstractJob, JobdagError, Scheduler};
use tokio::time::Instant;

/// Three independent jobs run in parallel; the run lasts as long as the
/// slowest one and every result is retrievable afterwards.
#[tokio::test(start_paused = true)]
async fn parallel_fan_out() {
    init_tracing();

    let recorder = Recorder::new();
    let a1 = recorder.timed_job("a1", 100);
    let a2 = recorder.timed_job("a2", 200);
    let a3 = recorder.timed_job("a3", 250);

    let sched = Scheduler::new();
    sched.add(&a1);
    sched.add(&a2);
    sched.add(&a3);

    let started = Instant::now();
    let ok = sched.co_run().await.expect("run should not raise");
    let elapsed = started.elapsed();

    assert!(ok);
    assert!(elapsed >= ms(250) && elapsed < ms(320), "elapsed {elapsed:?}");

    assert_eq!(*a1.result_as::<u64>().unwrap(), 100);
    assert_eq!(*a2.result_as::<u64>().unwrap(), 200);
    assert_eq!(*a3.result_as::<u64>().unwrap(), 250);
    assert_eq!(recorder.finish_order(), vec!["a1", "a2", "a3"]);
}

/// A two-job chain plus one free job: the dependent starts only after its
/// prerequisite is done, while the free job overlaps with both.
#[tokio::test(start_paused = true)]
async fn linear_dependency_with_free_job() {
    init_tracing();

    let recorder = Recorder::new();
    let b1 = recorder.timed_job("b1", 100);
    let b2 = recorder.timed_job("b2", 200);
    let b3 = recorder.timed_job("b3", 250);
    b2.requires(&b1);

    let sched = Scheduler::new();
    sched.add(&b1);
    sched.add(&b2);
    sched.add(&b3);

    let started = Instant::now();
    assert!(sched.co_run().await.unwrap());
    let elapsed = started.elapsed();

    assert!(elapsed >= ms(300) && elapsed < ms(370), "elapsed {elapsed:?}");

    let span_b1 = recorder.span("b1");
    let span_b2 = recorder.span("b2");
    let span_b3 = recorder.span("b3");
    assert!(span_b2.started >= span_b1.ended, "b2 must wait for b1");
    assert!(span_b3.started < span_b1.ended, "b3 is free to overlap");
}

/// Eight 500ms jobs under a window of 4 run in two waves.
#[tokio::test(start_paused = true)]
async fn jobs_window_two_waves() {
    init_tracing();

    let recorder = Recorder::new();
    let sched = Scheduler::builder().jobs_window(4).label("windowed").build();
    for i in 0..8 {
        sched.add(recorder.timed_job(&format!("w{i}"), 500));
    }

    let started = Instant::now();
    assert!(sched.co_run().await.unwrap());
    let elapsed = started.elapsed();

    assert!(
        elapsed >= ms(1000) && elapsed < ms(1100),
        "elapsed {elapsed:?}"
    );
    assert!(recorder.max_overlap() <= 4, "window must bound concurrency");
}

/// Re-running a completed scheduler is a no-op success that keeps the
/// recorded results.
#[tokio::test(start_paused = true)]
async fn rerun_is_noop() {
    init_tracing();

    let recorder = Recorder::new();
    let job = recorder.timed_job("once", 50);
    let sched = Scheduler::new();
    sched.add(&job);

    assert!(sched.co_run().await.unwrap());
    let started = Instant::now();
    assert!(sched.co_run().await.unwrap());
    assert!(started.elapsed() < ms(1), "second run must not execute anything");
    assert_eq!(recorder.spans().len(), 1);
    assert_eq!(*job.result_as::<u64>().unwrap(), 50);
}

/// Result inspection preconditions: not-done and no-result cases.
#[tokio::test(start_paused = true)]
async fn result_preconditions() {
    init_tracing();

    let job = noop_job("pending");
    assert!(matches!(job.result(), Err(JobdagError::NotYetDone(_))));

    let sched = Scheduler::new();
    sched.add(&job);
    assert!(sched.co_run().await.unwrap());
    assert!(job.result().is_ok());
}

/// Labels: explicit ones win, defaults derive from the body.
#[test]
fn labels() {
    let labelled = noop_job("explicit");
    assert_eq!(labelled.label(), "explicit");

    let unlabelled = jobdag::Job::new(async { anyhow::Ok(()) });
    assert!(unlabelled.label().starts_with("Job["), "{}", unlabelled.label());
}

/// The sync wrapper drives a run to completion without an ambient runtime.
#[test]
fn sync_run_wrapper() {
    init_tracing();

    let recorder = Recorder::new();
    let job = recorder.timed_job("sync", 10);
    let sched = Scheduler::new();
    sched.add(&job);

    assert!(sched.run().expect("sync run"));
    assert!(job.is_done());
}
