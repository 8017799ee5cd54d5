// src/scheduler/pure.rs

//! The scheduler engine.
//!
//! A [`PureScheduler`] owns a set of jobs and orchestrates one run of
//! them: jobs start as soon as their prerequisites are done, subject to
//! the concurrency window; the run ends when every non-forever job is
//! done, when the global deadline fires, when a critical job fails, or
//! when the scheduler is cancelled from the outside. Teardown then
//! cancels whatever is still in flight, waits out a bounded grace
//! period, and broadcasts the shutdown hook across the (possibly nested)
//! job tree.
//!
//! The model is single-threaded cooperative: every state mutation
//! happens from the scheduler's own task, either before dispatching a
//! job or while observing its completion.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::dag::GraphView;
use crate::errors::{JobdagError, Result};
use crate::job::{JobId, JobRef, JobValue, Outcome, Schedulable};
use crate::listing;

/// Why the last run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// Every non-forever job completed.
    Completed,
    /// The global deadline fired first.
    TimedOut,
    /// A critical job completed with an exception.
    CriticalFailure,
    /// `cancel()` was called while the run was in progress.
    Cancelled,
}

/// The set of jobs plus the engine that runs them.
pub struct PureScheduler {
    /// Members in insertion order, unique by id.
    jobs: Mutex<Vec<JobRef>>,
    jobs_window: usize,
    timeout: Option<Duration>,
    shutdown_timeout: Duration,
    critical: bool,
    label: Option<String>,
    verdict: Mutex<Option<RunVerdict>>,
    did_shutdown: AtomicBool,
    cancel_tx: watch::Sender<bool>,
}

impl PureScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            jobs: Mutex::new(Vec::new()),
            jobs_window: config.jobs_window,
            timeout: config.timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            critical: config.critical,
            label: config.label,
            verdict: Mutex::new(None),
            did_shutdown: AtomicBool::new(false),
            cancel_tx,
        }
    }

    pub fn builder() -> super::SchedulerBuilder {
        super::SchedulerBuilder::new()
    }

    // ---- the scheduler as a set of jobs

    /// Insert a job, or every job of a sequence. Re-inserting a member is
    /// a no-op.
    pub fn add(&self, item: impl Into<Schedulable>) {
        self.update(std::iter::once(item.into()));
    }

    /// Bulk insertion; returns `&self` for chaining.
    pub fn update<I>(&self, items: I) -> &Self
    where
        I: IntoIterator<Item = Schedulable>,
    {
        let mut jobs = self.jobs.lock().expect("job set poisoned");
        for job in Schedulable::flatten(items) {
            if jobs.iter().all(|existing| existing.id() != job.id()) {
                jobs.push(job);
            }
        }
        self
    }

    /// Remove one job; returns whether it was a member.
    pub fn remove(&self, job: &JobRef) -> bool {
        let mut jobs = self.jobs.lock().expect("job set poisoned");
        let before = jobs.len();
        jobs.retain(|existing| existing.id() != job.id());
        let removed = jobs.len() != before;
        if !removed {
            warn!(job = %job.label(), scheduler = %self.scope_label(), "remove: job is not a member");
        }
        removed
    }

    /// Snapshot of the members in insertion order.
    pub fn jobs(&self) -> Vec<JobRef> {
        self.jobs.lock().expect("job set poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, job: &JobRef) -> bool {
        self.jobs
            .lock()
            .expect("job set poisoned")
            .iter()
            .any(|existing| existing.id() == job.id())
    }

    // ---- configuration accessors

    pub fn jobs_window(&self) -> usize {
        self.jobs_window
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// The scheduler-level criticality, which is also the default
    /// inherited by member jobs that don't set their own flag.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn scope_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| "scheduler".to_string())
    }

    // ---- topology

    fn view(&self) -> GraphView {
        GraphView::new(&self.jobs())
    }

    /// True iff this scheduler, and every nested one at any depth, is
    /// acyclic.
    pub fn check_cycles(&self) -> bool {
        let jobs = self.jobs();
        if !GraphView::new(&jobs).check_cycles() {
            return false;
        }
        jobs.iter()
            .all(|job| job.as_scheduler().map_or(true, |nested| nested.check_cycles()))
    }

    /// Stable linearization of the members; nested schedulers count as
    /// single nodes.
    pub fn topological_order(&self) -> Result<Vec<JobRef>> {
        self.view().topological_order()
    }

    /// Jobs that any of `starts` directly requires.
    pub fn predecessors(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.view().predecessors(starts)
    }

    /// Jobs that directly require any of `starts`.
    pub fn successors(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.view().successors(starts)
    }

    /// Transitive closure of [`predecessors`](Self::predecessors).
    pub fn predecessors_upstream(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.view().predecessors_upstream(starts)
    }

    /// Transitive closure of [`successors`](Self::successors).
    pub fn successors_downstream(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.view().successors_downstream(starts)
    }

    /// Members with no prerequisite inside this scheduler.
    pub fn entry_jobs(&self) -> Vec<JobRef> {
        self.view().entry_jobs()
    }

    /// Members that no other member requires; forever jobs are skipped
    /// unless `discard_forever` is false.
    pub fn exit_jobs(&self, discard_forever: bool) -> Vec<JobRef> {
        self.view().exit_jobs(discard_forever)
    }

    // ---- pruning

    /// Drop every requirement that points outside this scheduler, warning
    /// per removal; recurses into nested schedulers. Returns true when
    /// nothing had to be dropped. Idempotent.
    pub fn sanitize(&self) -> bool {
        let jobs = self.jobs();
        let member_ids: HashSet<JobId> = jobs.iter().map(|job| job.id()).collect();
        let mut clean = true;

        for job in &jobs {
            let foreign: Vec<String> = job
                .core()
                .required_jobs()
                .iter()
                .filter(|req| !member_ids.contains(&req.id()))
                .map(|req| req.label())
                .collect();
            if !foreign.is_empty() {
                clean = false;
                warn!(
                    job = %job.label(),
                    scheduler = %self.scope_label(),
                    removed = ?foreign,
                    "dropping requirements that cross the scheduler boundary"
                );
                job.core()
                    .retain_requirements(|req| member_ids.contains(&req.id()));
            }
            if let Some(nested) = job.as_scheduler() {
                clean = nested.sanitize() && clean;
            }
        }
        clean
    }

    /// Remove `job` while preserving ordering: every prerequisite of `job`
    /// becomes a prerequisite of every member that required `job`.
    pub fn bypass_and_remove(&self, job: &JobRef) -> Result<()> {
        let jobs = self.jobs();
        if !jobs.iter().any(|existing| existing.id() == job.id()) {
            return Err(JobdagError::UnknownJob(job.label()));
        }

        let upstreams = job.core().required_jobs();
        let downstreams: Vec<JobRef> = jobs
            .iter()
            .filter(|down| {
                down.core()
                    .required_jobs()
                    .iter()
                    .any(|req| req.id() == job.id())
            })
            .cloned()
            .collect();

        for down in &downstreams {
            for up in &upstreams {
                down.core().add_requirement(up);
            }
            down.core().remove_requirement(job);
        }
        self.remove(job);
        Ok(())
    }

    /// Retain exactly the given members (non-members in `remains` are
    /// ignored), then sanitize to drop edges to the removed jobs.
    pub fn keep_only(&self, remains: &[JobRef]) {
        let keep: HashSet<JobId> = remains.iter().map(|job| job.id()).collect();
        self.jobs
            .lock()
            .expect("job set poisoned")
            .retain(|job| keep.contains(&job.id()));
        self.sanitize();
    }

    /// Retain the members reachable downstream from any of `starts` AND
    /// upstream from any of `ends`; an empty bound is unconstrained. The
    /// bounds themselves are always retained.
    pub fn keep_only_between(&self, starts: &[JobRef], ends: &[JobRef]) {
        let jobs = self.jobs();
        let view = GraphView::new(&jobs);

        let down: Vec<JobRef> = if starts.is_empty() {
            jobs.clone()
        } else {
            view.successors_downstream(starts)
        };
        let up: Vec<JobRef> = if ends.is_empty() {
            jobs.clone()
        } else {
            view.predecessors_upstream(ends)
        };

        let down_ids: HashSet<JobId> = down.iter().map(|job| job.id()).collect();
        let up_ids: HashSet<JobId> = up.iter().map(|job| job.id()).collect();

        let mut preserved: Vec<JobRef> = jobs
            .iter()
            .filter(|job| down_ids.contains(&job.id()) && up_ids.contains(&job.id()))
            .cloned()
            .collect();
        for bound in starts.iter().chain(ends.iter()) {
            if preserved.iter().all(|job| job.id() != bound.id()) {
                preserved.push(Arc::clone(bound));
            }
        }
        self.keep_only(&preserved);
    }

    // ---- run inspection

    pub fn verdict(&self) -> Option<RunVerdict> {
        *self.verdict.lock().expect("verdict poisoned")
    }

    fn record_verdict(&self, verdict: RunVerdict) {
        *self.verdict.lock().expect("verdict poisoned") = Some(verdict);
    }

    /// True iff the last run failed because a critical job raised.
    pub fn failed_critical(&self) -> bool {
        self.verdict() == Some(RunVerdict::CriticalFailure)
    }

    /// True iff the last run failed because the global deadline fired.
    pub fn failed_time_out(&self) -> bool {
        self.verdict() == Some(RunVerdict::TimedOut)
    }

    /// One line explaining why the last run failed, or `"FINE"`.
    pub fn why(&self) -> String {
        match self.verdict() {
            None | Some(RunVerdict::Completed) => "FINE".to_string(),
            Some(RunVerdict::TimedOut) => format!(
                "TIMED OUT after {:.1}s",
                self.timeout.map(|d| d.as_secs_f64()).unwrap_or(0.0)
            ),
            Some(RunVerdict::CriticalFailure) => {
                "a CRITICAL job has raised an exception".to_string()
            }
            Some(RunVerdict::Cancelled) => "CANCELLED from the outside".to_string(),
        }
    }

    /// One-line census like `2D + 3R + 4I = 9`.
    pub fn stats(&self) -> String {
        let jobs = self.jobs();
        let done = jobs.iter().filter(|job| job.is_done()).count();
        let ongoing = jobs
            .iter()
            .filter(|job| job.is_running() && !job.is_done())
            .count();
        let idle = jobs.len() - done - ongoing;
        format!("{done}D + {ongoing}R + {idle}I = {}", jobs.len())
    }

    /// One line per job, in topological order, with rank, badges, label,
    /// outcome and requirements. Fails on a cyclic graph; see
    /// [`list_safe`](Self::list_safe) for that case.
    pub fn list(&self) -> Result<String> {
        listing::list(self)
    }

    /// Like [`list`](Self::list) but works on broken graphs: numbering is
    /// positional rather than topological.
    pub fn list_safe(&self) -> String {
        listing::list_safe(self)
    }

    /// A post-mortem report: verdict, census, full listing, and details
    /// of every exception (critical ones first).
    pub fn debrief(&self) -> Result<String> {
        listing::debrief(self)
    }

    // ---- running

    /// Ask a run in progress to stop; the run's verdict becomes
    /// `Cancelled`. A no-op when nothing is running.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Synchronous wrapper around [`co_run`](Self::co_run): creates a
    /// current-thread runtime and blocks on it. Must not be called from
    /// inside an async context.
    pub fn run(&self) -> Result<bool> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(anyhow::Error::from)?;
        runtime.block_on(self.co_run())
    }

    /// Synchronous wrapper around [`co_shutdown`](Self::co_shutdown).
    pub fn shutdown(&self) -> Result<bool> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(anyhow::Error::from)?;
        Ok(runtime.block_on(self.co_shutdown()))
    }

    /// Run the member jobs to completion, respecting requirements, the
    /// concurrency window and the global deadline.
    ///
    /// Returns `Ok(true)` when every non-forever job completed. On
    /// timeout, critical failure or cancellation the return value depends
    /// on the scheduler's own criticality: critical schedulers raise an
    /// error typed by the failure, non-critical ones return `Ok(false)`.
    /// Either way the scheduler is fully quiesced first.
    pub async fn co_run(&self) -> Result<bool> {
        let jobs = self.jobs();
        *self.verdict.lock().expect("verdict poisoned") = None;
        self.did_shutdown.store(false, Ordering::SeqCst);
        self.cancel_tx.send_replace(false);

        // admission
        if jobs.is_empty() {
            return Err(JobdagError::NoEntryPoint(format!(
                "{} has no jobs",
                self.scope_label()
            )));
        }
        if jobs.iter().all(|job| job.is_done()) {
            debug!(scheduler = %self.scope_label(), "all jobs already done; run is a no-op");
            self.record_verdict(RunVerdict::Completed);
            return Ok(true);
        }
        if !self.check_cycles() {
            return Err(JobdagError::CycleDetected(self.scope_label()));
        }

        let n = jobs.len();
        let forever: Vec<bool> = jobs.iter().map(|job| job.is_forever()).collect();
        let predone: Vec<bool> = jobs.iter().map(|job| job.is_done()).collect();
        let finite_total = (0..n).filter(|&i| !forever[i] && !predone[i]).count();
        let mut finite_done = 0usize;

        let mut pending: Vec<usize> = (0..n).filter(|&i| !predone[i]).collect();
        let mut ready: VecDeque<usize> = VecDeque::new();
        let mut in_flight: HashSet<usize> = HashSet::new();
        let mut dispatched_any = false;

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut cancel_rx = self.cancel_tx.subscribe();
        let mut tasks: JoinSet<(usize, anyhow::Result<JobValue>)> = JoinSet::new();

        info!(
            scheduler = %self.scope_label(),
            jobs = n,
            window = self.jobs_window,
            "entering run"
        );

        loop {
            // promote jobs whose prerequisites are all done
            pending.retain(|&pos| {
                let fulfilled = jobs[pos]
                    .core()
                    .required_jobs()
                    .iter()
                    .all(|req| req.is_done());
                if fulfilled {
                    ready.push_back(pos);
                }
                !fulfilled
            });

            // dispatch under the window, in insertion order
            while self.jobs_window == 0 || in_flight.len() < self.jobs_window {
                let Some(pos) = ready.pop_front() else { break };
                let job = Arc::clone(&jobs[pos]);
                job.core().mark_scheduled();
                debug!(job = %job.label(), scheduler = %self.scope_label(), "dispatching job");
                in_flight.insert(pos);
                dispatched_any = true;
                tasks.spawn(run_job(pos, job));
            }

            if in_flight.is_empty() {
                if pending.is_empty() && ready.is_empty() {
                    // every job settled on its own, forever ones included
                    return self.succeed(&jobs, &mut tasks, &in_flight).await;
                }
                // nothing runs and nothing can start; the remaining jobs
                // wait on requirements this scheduler will never satisfy
                let stalled: Vec<String> =
                    pending.iter().map(|&pos| jobs[pos].label()).collect();
                if !dispatched_any {
                    return Err(JobdagError::NoEntryPoint(format!(
                        "{}: no startable job among [{}]",
                        self.scope_label(),
                        stalled.join(", ")
                    )));
                }
                return Err(JobdagError::CrossSchedulerRequirement(format!(
                    "{}: stalled jobs [{}] - run sanitize() before running",
                    self.scope_label(),
                    stalled.join(", ")
                )));
            }

            let completion = tokio::select! {
                biased;

                _ = wait_cancelled(&mut cancel_rx) => {
                    info!(scheduler = %self.scope_label(), "run cancelled from the outside");
                    return self.fail(RunVerdict::Cancelled, &jobs, &mut tasks, &in_flight).await;
                }

                _ = wait_deadline(deadline) => {
                    info!(scheduler = %self.scope_label(), "global timeout fired");
                    return self.fail(RunVerdict::TimedOut, &jobs, &mut tasks, &in_flight).await;
                }

                joined = tasks.join_next() => joined,
            };

            match completion {
                Some(Ok((pos, body_result))) => {
                    in_flight.remove(&pos);
                    let job = &jobs[pos];
                    let failed_critical = match body_result {
                        Ok(value) => {
                            debug!(job = %job.label(), "job done");
                            job.core().mark_done(Outcome::Value(value));
                            false
                        }
                        Err(err) => {
                            let critical = job.is_critical(self.critical);
                            warn!(job = %job.label(), critical, error = %err, "job raised an exception");
                            job.core().mark_done(Outcome::Failed(Arc::new(err)));
                            critical
                        }
                    };
                    if failed_critical {
                        return self
                            .fail(RunVerdict::CriticalFailure, &jobs, &mut tasks, &in_flight)
                            .await;
                    }
                    if !forever[pos] {
                        finite_done += 1;
                        if finite_done == finite_total {
                            // only forever jobs may still be in flight
                            return self.succeed(&jobs, &mut tasks, &in_flight).await;
                        }
                    }
                }
                Some(Err(join_err)) => {
                    // a task was aborted from outside the engine; the
                    // stall guard will surface the inconsistency
                    warn!(
                        scheduler = %self.scope_label(),
                        error = %join_err,
                        "in-flight job vanished"
                    );
                }
                None => {
                    return Err(JobdagError::Other(anyhow!(
                        "{}: completion stream dried up with jobs in flight",
                        self.scope_label()
                    )));
                }
            }
        }
    }

    async fn succeed(
        &self,
        jobs: &[JobRef],
        tasks: &mut JoinSet<(usize, anyhow::Result<JobValue>)>,
        in_flight: &HashSet<usize>,
    ) -> Result<bool> {
        if !in_flight.is_empty() {
            debug!(
                scheduler = %self.scope_label(),
                forever = in_flight.len(),
                "tidying forever jobs"
            );
        }
        self.quiesce(jobs, tasks, in_flight).await;
        self.co_shutdown().await;
        self.record_verdict(RunVerdict::Completed);
        info!(scheduler = %self.scope_label(), "run complete");
        Ok(true)
    }

    async fn fail(
        &self,
        verdict: RunVerdict,
        jobs: &[JobRef],
        tasks: &mut JoinSet<(usize, anyhow::Result<JobValue>)>,
        in_flight: &HashSet<usize>,
    ) -> Result<bool> {
        self.quiesce(jobs, tasks, in_flight).await;
        self.co_shutdown().await;
        self.record_verdict(verdict);
        if !self.critical {
            return Ok(false);
        }
        match verdict {
            RunVerdict::Completed => Ok(true),
            RunVerdict::TimedOut => Err(JobdagError::TimedOut(
                self.timeout.unwrap_or(Duration::ZERO),
            )),
            RunVerdict::Cancelled => Err(JobdagError::Cancelled),
            RunVerdict::CriticalFailure => Err(JobdagError::CriticalFailure(
                self.first_critical_failure(jobs),
            )),
        }
    }

    fn first_critical_failure(&self, jobs: &[JobRef]) -> String {
        for job in jobs {
            if job.is_critical(self.critical) {
                if let Some(err) = job.raised_exception() {
                    return format!("{}: {:#}", job.label(), err);
                }
            }
        }
        "critical job failure".to_string()
    }

    /// Cancel everything still in flight and wait out the grace period;
    /// whatever does not settle by itself is recorded as cancelled.
    async fn quiesce(
        &self,
        jobs: &[JobRef],
        tasks: &mut JoinSet<(usize, anyhow::Result<JobValue>)>,
        in_flight: &HashSet<usize>,
    ) {
        tasks.abort_all();
        let grace = Instant::now() + self.shutdown_timeout;

        loop {
            match timeout_at(grace, tasks.join_next()).await {
                Ok(Some(Ok((pos, body_result)))) => {
                    // settled concurrently with the abort; keep the real outcome
                    let job = &jobs[pos];
                    match body_result {
                        Ok(value) => job.core().mark_done(Outcome::Value(value)),
                        Err(err) => job.core().mark_done(Outcome::Failed(Arc::new(err))),
                    }
                }
                Ok(Some(Err(_aborted))) => {}
                Ok(None) => break,
                Err(_elapsed) => {
                    warn!(
                        scheduler = %self.scope_label(),
                        abandoned = tasks.len(),
                        "jobs did not settle within the shutdown grace period"
                    );
                    break;
                }
            }
        }

        for &pos in in_flight {
            let job = &jobs[pos];
            if !job.is_done() {
                job.core().mark_done(Outcome::Cancelled);
            }
        }
    }

    /// Broadcast the shutdown hook to every member, sequentially, bounded
    /// by `shutdown_timeout` overall; nested schedulers shut their own
    /// jobs down first. Hook errors are logged and swallowed. Idempotent:
    /// only the first call after a run does anything.
    ///
    /// Returns true when every hook completed within the grace period.
    pub async fn co_shutdown(&self) -> bool {
        if self.did_shutdown.swap(true, Ordering::SeqCst) {
            return true;
        }
        let jobs = self.jobs();
        if jobs.is_empty() {
            return true;
        }
        debug!(scheduler = %self.scope_label(), "broadcasting shutdown");
        let grace = Instant::now() + self.shutdown_timeout;
        let mut all_done = true;

        for job in &jobs {
            match timeout_at(grace, job.co_shutdown()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(job = %job.label(), error = %err, "co_shutdown failed");
                }
                Err(_elapsed) => {
                    warn!(job = %job.label(), "co_shutdown did not finish within the grace period");
                    all_done = false;
                }
            }
        }
        all_done
    }
}

impl Default for PureScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PureScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PureScheduler[{}] with {}", self.scope_label(), self.stats())
    }
}

/// Body wrapper spawned per job: flips the lifecycle to running, contains
/// panics, and tags the completion with the job's position.
async fn run_job(pos: usize, job: JobRef) -> (usize, anyhow::Result<JobValue>) {
    job.core().mark_running();
    let result = match std::panic::AssertUnwindSafe(job.co_run()).catch_unwind().await {
        Ok(body_result) => body_result,
        Err(payload) => Err(anyhow!("job panicked: {}", panic_message(payload.as_ref()))),
    };
    (pos, result)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("opaque panic payload")
}

/// Pends forever when no deadline is armed, so the select arm never fires.
async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Waits until the watch channel reports `true`, without holding the
/// channel's read guard across an await point (keeps the future `Send`).
async fn wait_cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}
