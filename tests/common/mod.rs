#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing_subscriber::{fmt, EnvFilter};

use jobdag::Job;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing**
///   tests (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.: `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Execution span of one job, in tokio time.
#[derive(Debug, Clone)]
pub struct Span {
    pub label: String,
    pub started: Instant,
    pub ended: Instant,
}

/// Records when fake jobs ran, for ordering and concurrency assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    spans: Arc<Mutex<Vec<Span>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job that sleeps `ms` milliseconds, records its span, and returns
    /// `ms` as its result.
    pub fn timed_job(&self, label: &str, ms: u64) -> Arc<Job> {
        let spans = Arc::clone(&self.spans);
        let span_label = label.to_string();
        Job::builder(async move {
            let started = Instant::now();
            sleep(Duration::from_millis(ms)).await;
            spans.lock().unwrap().push(Span {
                label: span_label,
                started,
                ended: Instant::now(),
            });
            Ok(ms)
        })
        .label(label)
        .build()
    }

    /// A job that sleeps `ms` milliseconds, records its span, then fails.
    pub fn failing_job(&self, label: &str, ms: u64) -> Arc<Job> {
        let spans = Arc::clone(&self.spans);
        let span_label = label.to_string();
        let err_label = label.to_string();
        Job::builder(async move {
            let started = Instant::now();
            sleep(Duration::from_millis(ms)).await;
            spans.lock().unwrap().push(Span {
                label: span_label,
                started,
                ended: Instant::now(),
            });
            Err::<u64, _>(anyhow::anyhow!("boom in {err_label}"))
        })
        .label(label)
        .build()
    }

    /// Like [`failing_job`](Self::failing_job) but flagged critical.
    pub fn failing_critical_job(&self, label: &str, ms: u64) -> Arc<Job> {
        let spans = Arc::clone(&self.spans);
        let span_label = label.to_string();
        let err_label = label.to_string();
        Job::builder(async move {
            let started = Instant::now();
            sleep(Duration::from_millis(ms)).await;
            spans.lock().unwrap().push(Span {
                label: span_label,
                started,
                ended: Instant::now(),
            });
            Err::<u64, _>(anyhow::anyhow!("boom in {err_label}"))
        })
        .label(label)
        .critical(true)
        .build()
    }

    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().unwrap().clone()
    }

    pub fn span(&self, label: &str) -> Span {
        self.spans()
            .into_iter()
            .find(|span| span.label == label)
            .unwrap_or_else(|| panic!("no span recorded for {label}"))
    }

    /// Labels in the order the jobs finished.
    pub fn finish_order(&self) -> Vec<String> {
        let mut spans = self.spans();
        spans.sort_by_key(|span| span.ended);
        spans.into_iter().map(|span| span.label).collect()
    }

    /// Peak number of simultaneously running recorded jobs.
    pub fn max_overlap(&self) -> usize {
        let mut events: Vec<(Instant, i32)> = Vec::new();
        for span in self.spans() {
            events.push((span.started, 1));
            events.push((span.ended, -1));
        }
        // ends sort before starts at the same instant
        events.sort_by_key(|&(at, delta)| (at, delta));
        let mut current = 0i32;
        let mut peak = 0i32;
        for (_, delta) in events {
            current += delta;
            peak = peak.max(current);
        }
        peak as usize
    }
}

/// A job with a trivial body, for graph-shape tests that never run.
pub fn noop_job(label: &str) -> Arc<Job> {
    Job::builder(async { anyhow::Ok(()) }).label(label).build()
}

/// A forever job bumping `ticks` every `period_ms` milliseconds.
pub fn monitor_job(label: &str, period_ms: u64, ticks: Arc<AtomicU32>) -> Arc<Job> {
    async fn tick(period_ms: u64, ticks: Arc<AtomicU32>) -> anyhow::Result<()> {
        loop {
            ticks.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(period_ms)).await;
        }
    }
    Job::builder(tick(period_ms, ticks))
        .label(label)
        .forever(true)
        .build()
}

/// A job whose body panics; the scheduler must contain it.
pub fn panicking_job(label: &str) -> Arc<Job> {
    async fn kaboom() -> anyhow::Result<u64> {
        panic!("kaboom")
    }
    Job::builder(kaboom()).label(label).build()
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
