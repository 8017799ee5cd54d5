// tests/exceptions.rs

mod common;

use common::{init_tracing, panicking_job, Recorder};

use jobdag::{AbstractJob, JobdagError, RunVerdict, Scheduler, Sequence};

/// A non-critical failure in the middle of a chain does not stop it: the
/// requirement is "completed", not "succeeded".
#[tokio::test(start_paused = true)]
async fn non_critical_failure_chain_survives() {
    init_tracing();

    let recorder = Recorder::new();
    let e1 = recorder.timed_job("e1", 200);
    let e2 = recorder.failing_job("e2", 200);
    let e3 = recorder.timed_job("e3", 300);

    let sched = Scheduler::builder().critical(false).build();
    sched.add(Sequence::chain([&e1, &e2, &e3]));

    assert!(sched.co_run().await.unwrap(), "non-critical failures succeed");
    assert_eq!(sched.verdict(), Some(RunVerdict::Completed));

    let err = e2.raised_exception().expect("e2 must store its error");
    assert!(err.to_string().contains("boom in e2"));
    assert!(matches!(e2.result(), Err(JobdagError::NoResult(_))));

    assert_eq!(*e3.result_as::<u64>().unwrap(), 300);
    let span_e2 = recorder.span("e2");
    let span_e3 = recorder.span("e3");
    assert!(span_e3.started >= span_e2.ended, "e3 still waits for e2");
}

/// The same chain with a critical middle job aborts: the downstream job
/// never leaves idle, the upstream one keeps its result.
#[tokio::test(start_paused = true)]
async fn critical_failure_aborts() {
    init_tracing();

    let recorder = Recorder::new();
    let e1 = recorder.timed_job("e1", 200);
    let e2 = recorder.failing_critical_job("e2", 200);
    let e3 = recorder.timed_job("e3", 300);
    e2.requires(&e1);
    e3.requires(&e2);

    let sched = Scheduler::builder().critical(false).build();
    sched.add(&e1);
    sched.add(&e2);
    sched.add(&e3);

    assert!(!sched.co_run().await.unwrap(), "critical failure fails the run");
    assert!(sched.failed_critical());
    assert_eq!(sched.verdict(), Some(RunVerdict::CriticalFailure));

    assert_eq!(*e1.result_as::<u64>().unwrap(), 200);
    assert!(e2.raised_exception().is_some());
    assert!(e3.is_idle(), "downstream of a critical failure stays idle");
}

/// A critical scheduler re-raises the failure instead of returning false.
#[tokio::test(start_paused = true)]
async fn critical_scheduler_raises() {
    init_tracing();

    let recorder = Recorder::new();
    let bad = recorder.failing_job("bad", 50);

    // jobs inherit the scheduler-level default criticality
    let sched = Scheduler::builder().critical(true).build();
    sched.add(&bad);

    match sched.co_run().await {
        Err(JobdagError::CriticalFailure(detail)) => {
            assert!(detail.contains("bad"), "detail: {detail}");
        }
        other => panic!("expected CriticalFailure, got {other:?}"),
    }
    assert!(sched.failed_critical());
}

/// Sibling jobs already in flight are cancelled by a critical failure.
#[tokio::test(start_paused = true)]
async fn critical_failure_cancels_in_flight() {
    init_tracing();

    let recorder = Recorder::new();
    let bad = recorder.failing_critical_job("bad", 100);
    let slow = recorder.timed_job("slow", 10_000);

    let sched = Scheduler::builder().critical(false).build();
    sched.add(&bad);
    sched.add(&slow);

    assert!(!sched.co_run().await.unwrap());
    assert!(slow.is_done());
    assert!(matches!(
        slow.outcome(),
        Some(jobdag::Outcome::Cancelled)
    ));
}

/// A panicking body is contained and recorded like a raising one.
#[tokio::test(start_paused = true)]
async fn panic_is_contained() {
    init_tracing();

    let recorder = Recorder::new();
    let boom = panicking_job("boom");
    let after = recorder.timed_job("after", 50);
    after.requires(&boom);

    let sched = Scheduler::builder().critical(false).build();
    sched.add(&boom);
    sched.add(&after);

    assert!(sched.co_run().await.unwrap());
    let err = boom.raised_exception().expect("panic must be recorded");
    assert!(err.to_string().contains("panicked"), "{err:#}");
    assert!(after.is_done(), "successors still run after a contained panic");
}
