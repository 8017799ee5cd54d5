// src/errors.rs

//! Crate-wide error taxonomy.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobdagError {
    #[error("cycle detected in requirement graph: {0}")]
    CycleDetected(String),

    #[error("no entry point: {0}")]
    NoEntryPoint(String),

    #[error("requirement crosses scheduler boundary: {0}")]
    CrossSchedulerRequirement(String),

    #[error("critical job failed: {0}")]
    CriticalFailure(String),

    #[error("scheduler timed out after {0:?}")]
    TimedOut(Duration),

    #[error("scheduler was cancelled")]
    Cancelled,

    #[error("job not done yet: {0}")]
    NotYetDone(String),

    #[error("job has no result: {0}")]
    NoResult(String),

    #[error("job not in scheduler: {0}")]
    UnknownJob(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, JobdagError>;
