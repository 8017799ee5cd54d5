// tests/forever_timeout.rs

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use common::{init_tracing, monitor_job, ms, Recorder};

use jobdag::{AbstractJob, JobdagError, Outcome, RunVerdict, Scheduler};
use tokio::time::{sleep, Instant};

/// A forever monitor next to three finite workers: the run ends when the
/// workers are done, and the monitor is cancelled rather than awaited.
#[tokio::test(start_paused = true)]
async fn forever_job_is_tidied() {
    init_tracing();

    let recorder = Recorder::new();
    let ticks = Arc::new(AtomicU32::new(0));
    let monitor = monitor_job("monitor", 50, Arc::clone(&ticks));
    let c1 = recorder.timed_job("c1", 100);
    let c2 = recorder.timed_job("c2", 150);
    let c3 = recorder.timed_job("c3", 50);
    c3.requires(&c1);

    let sched = Scheduler::new();
    sched.add(&monitor);
    sched.add(&c1);
    sched.add(&c2);
    sched.add(&c3);

    assert!(sched.co_run().await.unwrap());

    assert!(c1.is_done() && c2.is_done() && c3.is_done());
    assert!(monitor.is_done());
    assert!(matches!(monitor.outcome(), Some(Outcome::Cancelled)));
    assert!(
        matches!(monitor.result(), Err(JobdagError::NoResult(_))),
        "a cancelled forever job stores no value"
    );
    assert!(ticks.load(Ordering::SeqCst) >= 3);
}

/// Global timeout: the run is cut short, the verdict says so, and the
/// forever job ticked for as long as the deadline allowed.
#[tokio::test(start_paused = true)]
async fn global_timeout_fires() {
    init_tracing();

    let ticks = Arc::new(AtomicU32::new(0));
    let monitor = monitor_job("ticker", 100, Arc::clone(&ticks));

    let sched = Scheduler::builder()
        .critical(false)
        .timeout(ms(250))
        .label("deadline")
        .build();
    sched.add(&monitor);

    let started = Instant::now();
    let ok = sched.co_run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(!ok);
    assert!(elapsed >= ms(250) && elapsed < ms(320), "elapsed {elapsed:?}");
    assert!(sched.failed_time_out());
    assert_eq!(sched.verdict(), Some(RunVerdict::TimedOut));
    assert!(sched.why().contains("TIMED OUT"));

    assert!(monitor.is_done());
    assert!(matches!(monitor.outcome(), Some(Outcome::Cancelled)));
    // ticks at 0ms, 100ms and 200ms
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

/// The same timeout on a critical scheduler raises instead of returning
/// false.
#[tokio::test(start_paused = true)]
async fn critical_scheduler_timeout_raises() {
    init_tracing();

    let ticks = Arc::new(AtomicU32::new(0));
    let sched = Scheduler::builder().timeout(ms(100)).build();
    sched.add(monitor_job("ticker", 40, ticks));

    match sched.co_run().await {
        Err(JobdagError::TimedOut(timeout)) => {
            assert!(timeout >= ms(99) && timeout <= ms(101), "timeout {timeout:?}");
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
    assert!(sched.failed_time_out());
}

/// External cancellation stops a run in progress and cancels whatever was
/// in flight.
#[tokio::test(start_paused = true)]
async fn external_cancellation() {
    init_tracing();

    let recorder = Recorder::new();
    let slow = recorder.timed_job("slow", 10_000);
    let sched = Scheduler::builder().critical(false).build();
    sched.add(&slow);

    let runner = Arc::clone(&sched);
    let handle = tokio::spawn(async move { runner.co_run().await });

    sleep(ms(50)).await;
    sched.cancel();

    let ok = handle.await.expect("runner task").expect("non-critical run");
    assert!(!ok);
    assert_eq!(sched.verdict(), Some(RunVerdict::Cancelled));
    assert!(slow.is_done());
    assert!(matches!(slow.outcome(), Some(Outcome::Cancelled)));
}

/// Cancelling a critical scheduler surfaces the dedicated error.
#[tokio::test(start_paused = true)]
async fn cancellation_raises_when_critical() {
    init_tracing();

    let recorder = Recorder::new();
    let sched = Scheduler::builder().label("doomed").build();
    sched.add(recorder.timed_job("slow", 10_000));

    let runner = Arc::clone(&sched);
    let handle = tokio::spawn(async move { runner.co_run().await });

    sleep(ms(10)).await;
    sched.cancel();

    match handle.await.expect("runner task") {
        Err(JobdagError::Cancelled) => {}
        other => panic!("expected Cancelled, got {other:?}"),
    }
}
