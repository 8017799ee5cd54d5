// src/scheduler/mod.rs

//! Schedulers: the runtime engines that orchestrate a job DAG.
//!
//! - [`pure`] holds [`PureScheduler`], the engine proper: job-set
//!   management, graph pruning, admission, the run loop, and teardown.
//! - [`nested`] holds [`Scheduler`], the flavor that is *also* a job and
//!   can therefore be embedded in another scheduler.
//!
//! Users who never nest can use [`PureScheduler`] directly; in practice
//! it is simpler to always create [`Scheduler`] instances.

pub mod nested;
pub mod pure;

pub use nested::Scheduler;
pub use pure::{PureScheduler, RunVerdict};

use std::sync::Arc;
use std::time::Duration;

use crate::config::SchedulerConfig;

/// Builder shared by both scheduler flavors.
#[derive(Debug, Clone, Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Cap on simultaneously running jobs; 0 means unbounded.
    pub fn jobs_window(mut self, jobs_window: usize) -> Self {
        self.config.jobs_window = jobs_window;
        self
    }

    /// Global deadline for one run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Grace period for teardown and the shutdown broadcast.
    pub fn shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.config.shutdown_timeout_secs = shutdown_timeout.as_secs_f64();
        self
    }

    /// Whether a failed run raises rather than returning `false`; also the
    /// criticality default inherited by member jobs.
    pub fn critical(mut self, critical: bool) -> Self {
        self.config.critical = critical;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Mark the composite job as forever (meaningful only when nested).
    pub fn forever(mut self, forever: bool) -> Self {
        self.config.forever = forever;
        self
    }

    /// Build the engine-only flavor.
    pub fn build_pure(self) -> PureScheduler {
        PureScheduler::with_config(self.config)
    }

    /// Build the nestable flavor.
    pub fn build(self) -> Arc<Scheduler> {
        Scheduler::with_config(self.config)
    }
}
