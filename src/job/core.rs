// src/job/core.rs

//! Shared per-job state: identity, flags, requirement edges, lifecycle.
//!
//! Every [`AbstractJob`](crate::job::AbstractJob) implementation embeds one
//! [`JobCore`] and hands it out through `core()`. The scheduler drives all
//! state transitions; user code only reads them back.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{JobdagError, Result};
use crate::job::JobRef;

/// Process-unique job identity.
///
/// Used as the node key for graph algorithms and for set membership; two
/// clones of the same `Arc` compare equal, two distinct jobs never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        JobId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a job is in its life: `Idle -> Scheduled -> Running -> Done`.
///
/// Transitions are monotone; a `Done` job is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Idle,
    Scheduled,
    Running,
    Done,
}

/// The value a job body produced.
///
/// Kept as `Any` so jobs with heterogeneous result types can live in one
/// scheduler; callers downcast on inspection.
pub type JobValue = Arc<dyn Any + Send + Sync>;

/// How a job ended. Populated exactly when the lifecycle is `Done`.
#[derive(Clone)]
pub enum Outcome {
    /// The body returned a value.
    Value(JobValue),
    /// The body returned an error or panicked.
    Failed(Arc<anyhow::Error>),
    /// The scheduler cancelled the job before it settled.
    Cancelled,
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Value(_) => f.write_str("Value(..)"),
            Outcome::Failed(err) => write!(f, "Failed({err:#})"),
            Outcome::Cancelled => f.write_str("Cancelled"),
        }
    }
}

#[derive(Debug)]
struct RunSlot {
    lifecycle: Lifecycle,
    outcome: Option<Outcome>,
}

/// State common to every job flavor.
pub struct JobCore {
    id: JobId,
    label: Option<String>,
    /// `None` inherits the enclosing scheduler's default at run time.
    critical: Option<bool>,
    forever: bool,
    slot: Mutex<RunSlot>,
    /// Direct prerequisites, in insertion order, unique by id.
    required: Mutex<Vec<JobRef>>,
    /// Rank string assigned by the enclosing scheduler for listings.
    sched_id: Mutex<Option<String>>,
}

impl JobCore {
    pub fn new(label: Option<String>, critical: Option<bool>, forever: bool) -> Self {
        Self {
            id: JobId::fresh(),
            label,
            critical,
            forever,
            slot: Mutex::new(RunSlot {
                lifecycle: Lifecycle::Idle,
                outcome: None,
            }),
            required: Mutex::new(Vec::new()),
            sched_id: Mutex::new(None),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn label_opt(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn critical_flag(&self) -> Option<bool> {
        self.critical
    }

    pub fn forever(&self) -> bool {
        self.forever
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.slot.lock().expect("job state poisoned").lifecycle
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.slot.lock().expect("job state poisoned").outcome.clone()
    }

    // Transitions only ever move forward; a late transition request against
    // an already-done job is ignored so a settled outcome is never clobbered.

    pub(crate) fn mark_scheduled(&self) {
        let mut slot = self.slot.lock().expect("job state poisoned");
        if slot.lifecycle < Lifecycle::Scheduled {
            slot.lifecycle = Lifecycle::Scheduled;
        }
    }

    pub(crate) fn mark_running(&self) {
        let mut slot = self.slot.lock().expect("job state poisoned");
        if slot.lifecycle < Lifecycle::Running {
            slot.lifecycle = Lifecycle::Running;
        }
    }

    pub(crate) fn mark_done(&self, outcome: Outcome) {
        let mut slot = self.slot.lock().expect("job state poisoned");
        if slot.lifecycle < Lifecycle::Done {
            slot.lifecycle = Lifecycle::Done;
            slot.outcome = Some(outcome);
        }
    }

    /// The stored value.
    ///
    /// Fails with [`JobdagError::NotYetDone`] before completion and with
    /// [`JobdagError::NoResult`] when the outcome was an exception or a
    /// cancellation.
    pub fn result(&self) -> Result<JobValue> {
        let slot = self.slot.lock().expect("job state poisoned");
        if slot.lifecycle != Lifecycle::Done {
            return Err(JobdagError::NotYetDone(self.describe()));
        }
        match &slot.outcome {
            Some(Outcome::Value(value)) => Ok(Arc::clone(value)),
            _ => Err(JobdagError::NoResult(self.describe())),
        }
    }

    /// The stored error, if the job completed by failing.
    pub fn raised_exception(&self) -> Option<Arc<anyhow::Error>> {
        let slot = self.slot.lock().expect("job state poisoned");
        match &slot.outcome {
            Some(Outcome::Failed(err)) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.id.to_string(),
        }
    }

    /// Snapshot of the direct prerequisites.
    pub fn required_jobs(&self) -> Vec<JobRef> {
        self.required.lock().expect("requirements poisoned").clone()
    }

    /// Add one prerequisite edge. Requiring oneself is a no-op, and so is
    /// adding an edge that is already present.
    pub fn add_requirement(&self, req: &JobRef) {
        if req.id() == self.id {
            return;
        }
        let mut required = self.required.lock().expect("requirements poisoned");
        if required.iter().all(|existing| existing.id() != req.id()) {
            required.push(Arc::clone(req));
        }
    }

    /// Drop one prerequisite edge. Returns whether it was present.
    pub fn remove_requirement(&self, req: &JobRef) -> bool {
        let mut required = self.required.lock().expect("requirements poisoned");
        let before = required.len();
        required.retain(|existing| existing.id() != req.id());
        required.len() != before
    }

    /// Keep only the prerequisites accepted by `keep`; returns how many
    /// edges were dropped. Used by `sanitize` and the pruning operations.
    pub(crate) fn retain_requirements(&self, keep: impl Fn(&JobRef) -> bool) -> usize {
        let mut required = self.required.lock().expect("requirements poisoned");
        let before = required.len();
        required.retain(|job| keep(job));
        before - required.len()
    }

    pub(crate) fn sched_id(&self) -> Option<String> {
        self.sched_id.lock().expect("sched id poisoned").clone()
    }

    pub(crate) fn set_sched_id(&self, id: Option<String>) {
        *self.sched_id.lock().expect("sched id poisoned") = id;
    }
}

impl std::fmt::Debug for JobCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCore")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("critical", &self.critical)
            .field("forever", &self.forever)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
