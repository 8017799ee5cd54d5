// src/scheduler/nested.rs

//! The scheduler flavor that is also a job.
//!
//! A [`Scheduler`] embeds a [`PureScheduler`] and a
//! [`JobCore`](crate::job::JobCore), so it can be inserted in another
//! scheduler like any job. The outer scheduler sees it as a single
//! opaque node: edges at the outer level gate when the composite starts;
//! its internal jobs are invisible to the outer graph and no edge may
//! cross the boundary.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SchedulerConfig;
use crate::errors::Result;
use crate::job::{AbstractJob, JobCore, JobRef, JobValue, Schedulable};
use crate::scheduler::{PureScheduler, SchedulerBuilder};

/// A nestable scheduler: a [`PureScheduler`] that implements
/// [`AbstractJob`].
///
/// When used as a job, its criticality in the outer graph is the one the
/// scheduler itself was built with, so a failing critical nested
/// scheduler is classified as a critical failure by its host.
pub struct Scheduler {
    pure: PureScheduler,
    core: JobCore,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub fn with_config(config: SchedulerConfig) -> Arc<Self> {
        let core = JobCore::new(
            config.label.clone(),
            Some(config.critical),
            config.forever,
        );
        Arc::new(Self {
            pure: PureScheduler::with_config(config),
            core,
        })
    }

    /// The embedded engine.
    pub fn pure(&self) -> &PureScheduler {
        &self.pure
    }

    /// Run the internal graph; see [`PureScheduler::co_run`].
    ///
    /// This inherent method shadows the [`AbstractJob`] one so direct
    /// callers get the `bool` form; the trait flavor is what an outer
    /// scheduler invokes.
    pub async fn co_run(&self) -> Result<bool> {
        self.pure.co_run().await
    }

    /// Synchronous wrapper; see [`PureScheduler::run`].
    pub fn run(&self) -> Result<bool> {
        self.pure.run()
    }

    /// Broadcast the shutdown hook through the internal job tree.
    pub async fn co_shutdown(&self) -> bool {
        self.pure.co_shutdown().await
    }

    /// Synchronous wrapper; see [`PureScheduler::shutdown`].
    pub fn shutdown(&self) -> Result<bool> {
        self.pure.shutdown()
    }

    /// Gate the composite's start on another job or sequence (an edge at
    /// the *outer* level).
    pub fn requires(&self, req: impl Into<Schedulable>) -> &Self {
        if let Some(tail) = req.into().requirement_tail() {
            self.core.add_requirement(&tail);
        }
        self
    }

    /// Drop an outer-level prerequisite edge.
    pub fn unrequire(&self, req: &JobRef) -> bool {
        self.core.remove_requirement(req)
    }
}

/// All set, topology, pruning and inspection methods of the embedded
/// engine are available on the nested flavor directly.
impl Deref for Scheduler {
    type Target = PureScheduler;

    fn deref(&self) -> &PureScheduler {
        &self.pure
    }
}

#[async_trait]
impl AbstractJob for Scheduler {
    fn core(&self) -> &JobCore {
        &self.core
    }

    async fn co_run(&self) -> anyhow::Result<JobValue> {
        // a critical scheduler raises out of the engine, so the outer
        // scheduler records an exception outcome for the composite
        let ok = self.pure.co_run().await?;
        Ok(Arc::new(ok) as JobValue)
    }

    async fn co_shutdown(&self) -> anyhow::Result<()> {
        self.pure.co_shutdown().await;
        Ok(())
    }

    fn as_scheduler(&self) -> Option<&PureScheduler> {
        Some(&self.pure)
    }

    fn text_label(&self) -> Option<String> {
        self.pure.label().map(str::to_string)
    }

    fn type_label(&self) -> &'static str {
        "Scheduler"
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scheduler[{}] with {}", self.pure.scope_label(), self.pure.stats())
    }
}
