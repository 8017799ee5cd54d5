// src/job/mod.rs

//! Jobs: the nodes of a scheduler's requirement graph.
//!
//! - [`AbstractJob`] is the seam every schedulable entity implements; the
//!   scheduler only ever talks to this trait.
//! - [`Job`] is the leaf flavor wrapping one user-supplied future.
//! - [`Schedulable`] is what insertion and requirement APIs accept: a job
//!   or a [`Sequence`](crate::sequence::Sequence), flattened on use.

pub mod core;

use std::any::Any;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::errors::{JobdagError, Result};
use crate::scheduler::PureScheduler;
use crate::sequence::Sequence;

pub use self::core::{JobCore, JobId, JobValue, Lifecycle, Outcome};

/// How jobs are shared between user code, requirement edges and schedulers.
pub type JobRef = Arc<dyn AbstractJob>;

/// The contract between a scheduler and the entities it runs.
///
/// Implementations embed a [`JobCore`] and expose it through [`core()`];
/// everything else (predicates, result inspection, requirement edges) is
/// provided on top of it. `co_run` is invoked exactly once per run, after
/// all prerequisites are done; `co_shutdown` is broadcast by the enclosing
/// scheduler after its run ends and must be idempotent.
#[async_trait]
pub trait AbstractJob: Send + Sync {
    /// The shared state record backing this job.
    fn core(&self) -> &JobCore;

    /// The job's asynchronous work. Must be cancellation-tolerant.
    async fn co_run(&self) -> anyhow::Result<JobValue>;

    /// Housekeeping hook invoked when the enclosing scheduler winds down.
    async fn co_shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Nested schedulers expose their engine here so graph analyses and
    /// shutdown can recurse; plain jobs return `None`.
    fn as_scheduler(&self) -> Option<&PureScheduler> {
        None
    }

    /// Fallback display label when none was set explicitly.
    fn text_label(&self) -> Option<String> {
        None
    }

    /// Short type tag used in listings.
    fn type_label(&self) -> &'static str {
        "Job"
    }

    fn id(&self) -> JobId {
        self.core().id()
    }

    /// Display label: the explicit label, the flavor's [`text_label`],
    /// or `NOLABEL`.
    fn label(&self) -> String {
        if let Some(label) = self.core().label_opt() {
            return label.to_string();
        }
        self.text_label().unwrap_or_else(|| "NOLABEL".to_string())
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core().lifecycle()
    }

    fn is_idle(&self) -> bool {
        self.lifecycle() == Lifecycle::Idle
    }

    /// True once the job has been handed to the windowing machinery.
    /// Implied by `is_running` and `is_done`.
    fn is_scheduled(&self) -> bool {
        self.lifecycle() >= Lifecycle::Scheduled
    }

    /// True once the job's body has started. Implied by `is_done`.
    fn is_running(&self) -> bool {
        self.lifecycle() >= Lifecycle::Running
    }

    fn is_done(&self) -> bool {
        self.lifecycle() == Lifecycle::Done
    }

    fn is_forever(&self) -> bool {
        self.core().forever()
    }

    /// Effective criticality, falling back to the enclosing scheduler's
    /// default when the job did not set its own flag.
    fn is_critical(&self, default_critical: bool) -> bool {
        self.core().critical_flag().unwrap_or(default_critical)
    }

    fn outcome(&self) -> Option<Outcome> {
        self.core().outcome()
    }

    /// The stored result value; see [`JobCore::result`] for the failure modes.
    fn result(&self) -> Result<JobValue> {
        self.core().result()
    }

    /// Downcast convenience over [`result`](AbstractJob::result).
    fn result_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>>
    where
        Self: Sized,
    {
        self.result()?
            .downcast::<T>()
            .map_err(|_| JobdagError::NoResult(format!("{}: unexpected result type", self.label())))
    }

    fn raised_exception(&self) -> Option<Arc<anyhow::Error>> {
        self.core().raised_exception()
    }
}

/// A job, or a sequence of jobs, as accepted by insertion and requirement
/// APIs. Sequences are flattened on use; only the member jobs matter to
/// the scheduler.
#[derive(Clone)]
pub enum Schedulable {
    Job(JobRef),
    Sequence(Sequence),
}

impl Schedulable {
    /// All member jobs, in order.
    pub fn jobs(&self) -> Vec<JobRef> {
        match self {
            Schedulable::Job(job) => vec![Arc::clone(job)],
            Schedulable::Sequence(seq) => seq.jobs().to_vec(),
        }
    }

    /// Flatten a mixed collection into an ordered job list.
    pub fn flatten<I>(items: I) -> Vec<JobRef>
    where
        I: IntoIterator<Item = Schedulable>,
    {
        items.into_iter().flat_map(|item| item.jobs()).collect()
    }

    /// The job a requirement on this entity resolves to: the job itself,
    /// or the tail of a sequence.
    pub(crate) fn requirement_tail(&self) -> Option<JobRef> {
        match self {
            Schedulable::Job(job) => Some(Arc::clone(job)),
            Schedulable::Sequence(seq) => seq.jobs().last().cloned(),
        }
    }
}

impl<J: AbstractJob + 'static> From<Arc<J>> for Schedulable {
    fn from(job: Arc<J>) -> Self {
        Schedulable::Job(job)
    }
}

impl<J: AbstractJob + 'static> From<&Arc<J>> for Schedulable {
    fn from(job: &Arc<J>) -> Self {
        let job: Arc<dyn AbstractJob> = job.clone();
        Schedulable::Job(job)
    }
}

impl From<JobRef> for Schedulable {
    fn from(job: JobRef) -> Self {
        Schedulable::Job(job)
    }
}

impl From<&JobRef> for Schedulable {
    fn from(job: &JobRef) -> Self {
        Schedulable::Job(Arc::clone(job))
    }
}

impl From<Sequence> for Schedulable {
    fn from(seq: Sequence) -> Self {
        Schedulable::Sequence(seq)
    }
}

impl From<&Sequence> for Schedulable {
    fn from(seq: &Sequence) -> Self {
        Schedulable::Sequence(seq.clone())
    }
}

type JobBody = BoxFuture<'static, anyhow::Result<JobValue>>;
type ShutdownBody = BoxFuture<'static, anyhow::Result<()>>;

/// The leaf job flavor: wraps one future, evaluated when the job runs.
///
/// The future is consumed on first `co_run`; a job is never restarted.
/// If the body spawns extra concurrent work of its own, the scheduler
/// knows nothing about it; bodies must await their own sub-tasks.
pub struct Job {
    core: JobCore,
    body_name: &'static str,
    body: Mutex<Option<JobBody>>,
    on_shutdown: Mutex<Option<ShutdownBody>>,
}

impl Job {
    /// Wrap a future into a job with default flags.
    pub fn new<F, T>(body: F) -> Arc<Self>
    where
        F: std::future::Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        Self::builder(body).build()
    }

    /// Start building a job around `body`.
    pub fn builder<F, T>(body: F) -> JobBuilder
    where
        F: std::future::Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let body_name = std::any::type_name::<F>();
        let body: JobBody = body
            .map(|res| res.map(|value| Arc::new(value) as JobValue))
            .boxed();
        JobBuilder {
            label: None,
            critical: None,
            forever: false,
            required: Vec::new(),
            body,
            body_name,
            on_shutdown: None,
        }
    }

    /// Add a prerequisite: this job will not start before `req` (or, for a
    /// sequence, its tail job) is done.
    pub fn requires(&self, req: impl Into<Schedulable>) -> &Self {
        if let Some(tail) = req.into().requirement_tail() {
            self.core.add_requirement(&tail);
        }
        self
    }

    /// Drop a prerequisite edge; returns whether it was present.
    pub fn unrequire(&self, req: &JobRef) -> bool {
        self.core.remove_requirement(req)
    }
}

#[async_trait]
impl AbstractJob for Job {
    fn core(&self) -> &JobCore {
        &self.core
    }

    async fn co_run(&self) -> anyhow::Result<JobValue> {
        let body = self.body.lock().expect("job body poisoned").take();
        match body {
            Some(body) => body.await,
            None => Err(anyhow!("job body already consumed: {}", self.label())),
        }
    }

    async fn co_shutdown(&self) -> anyhow::Result<()> {
        // take() makes repeated shutdowns no-ops
        let hook = self.on_shutdown.lock().expect("shutdown body poisoned").take();
        match hook {
            Some(hook) => hook.await,
            None => Ok(()),
        }
    }

    fn text_label(&self) -> Option<String> {
        Some(format!("Job[{}]", short_body_name(self.body_name)))
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label())
            .field("core", &self.core)
            .finish()
    }
}

/// Builder for [`Job`], configuring flags and initial requirements.
pub struct JobBuilder {
    label: Option<String>,
    critical: Option<bool>,
    forever: bool,
    required: Vec<Schedulable>,
    body: JobBody,
    body_name: &'static str,
    on_shutdown: Option<ShutdownBody>,
}

impl JobBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Explicit criticality; unset jobs inherit the scheduler's default.
    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = Some(critical);
        self
    }

    /// A forever job is never awaited; it is cancelled when the scheduler
    /// would otherwise finish.
    pub fn forever(mut self, forever: bool) -> Self {
        self.forever = forever;
        self
    }

    /// Add an initial prerequisite (may be called several times).
    pub fn requires(mut self, req: impl Into<Schedulable>) -> Self {
        self.required.push(req.into());
        self
    }

    /// Housekeeping future awaited when the enclosing scheduler shuts down.
    pub fn on_shutdown<F>(mut self, hook: F) -> Self
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_shutdown = Some(hook.boxed());
        self
    }

    pub fn build(self) -> Arc<Job> {
        let job = Arc::new(Job {
            core: JobCore::new(self.label, self.critical, self.forever),
            body_name: self.body_name,
            body: Mutex::new(Some(self.body)),
            on_shutdown: Mutex::new(self.on_shutdown),
        });
        for req in &self.required {
            job.requires(req.clone());
        }
        job
    }

    /// Build and immediately insert into `sched`.
    pub fn build_into(self, sched: &PureScheduler) -> Arc<Job> {
        let job = self.build();
        sched.add(&job);
        job
    }
}

/// Derive a human label from the type name of the wrapped future,
/// e.g. `my_app::provision::upload_image::{{closure}}` -> `upload_image`.
fn short_body_name(type_name: &str) -> &str {
    let mut name = type_name;
    while let Some(stripped) = name.strip_suffix("}}") {
        match stripped.rfind("::{{") {
            Some(pos) => name = &name[..pos],
            None => break,
        }
    }
    name.rsplit("::").next().unwrap_or(name)
}
