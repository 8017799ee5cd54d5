// src/lib.rs

//! `jobdag` - dependency-driven orchestration of cooperative async jobs.
//!
//! A user declaratively assembles a DAG of [`Job`]s - each wrapping one
//! asynchronous computation - and hands it to a [`Scheduler`], which runs
//! every job as soon as its prerequisites are done, subject to an optional
//! concurrency window and global timeout. Schedulers are themselves jobs,
//! so whole subgraphs nest as reusable pieces of workflow.
//!
//! ```no_run
//! use jobdag::{Job, Scheduler, Sequence};
//!
//! # async fn fetch() -> anyhow::Result<u64> { Ok(0) }
//! # async fn build() -> anyhow::Result<u64> { Ok(0) }
//! # async fn deploy() -> anyhow::Result<u64> { Ok(0) }
//! let fetch = Job::builder(fetch()).label("fetch").build();
//! let build = Job::builder(build()).label("build").build();
//! let deploy = Job::builder(deploy()).label("deploy").critical(true).build();
//!
//! let sched = Scheduler::new();
//! sched.add(Sequence::chain([&fetch, &build, &deploy]));
//! let _ok = sched.run()?;
//! # Ok::<(), jobdag::JobdagError>(())
//! ```
//!
//! Failure policy in one paragraph: a job that raises is recorded and, by
//! default, fatal - unless it (or its scheduler) opted out of `critical`.
//! Non-critical failures let the rest of the graph proceed: a requirement
//! is "completed", not "succeeded". `forever` jobs are never awaited and
//! are cancelled when the scheduler would otherwise finish. After the run,
//! every job can be inspected for its result or exception.

pub mod config;
pub mod dag;
pub mod dot;
pub mod errors;
pub mod job;
mod listing;
pub mod logging;
pub mod scheduler;
pub mod sequence;

pub use config::SchedulerConfig;
pub use dag::GraphView;
pub use dot::dot_format;
pub use errors::{JobdagError, Result};
pub use job::{
    AbstractJob, Job, JobBuilder, JobCore, JobId, JobRef, JobValue, Lifecycle, Outcome,
    Schedulable,
};
pub use logging::init_logging;
pub use scheduler::{PureScheduler, RunVerdict, Scheduler, SchedulerBuilder};
pub use sequence::Sequence;
