// src/config.rs

//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a scheduler run.
///
/// The job graph itself is always built in code; this struct only carries
/// the orchestration knobs, so it can be embedded in a larger application
/// configuration and deserialized from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of simultaneously running jobs (0 = unbounded).
    #[serde(default)]
    pub jobs_window: usize,

    /// Global deadline for one run, in seconds (absent = unbounded).
    #[serde(default)]
    pub timeout_secs: Option<f64>,

    /// Grace period for teardown and the shutdown broadcast, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: f64,

    /// Whether a failed run raises (true) or merely returns false.
    /// Also the default criticality inherited by jobs that don't set one.
    #[serde(default = "default_critical")]
    pub critical: bool,

    /// Display label for the scheduler.
    #[serde(default)]
    pub label: Option<String>,

    /// Only meaningful when the scheduler is nested in another one:
    /// the composite job is then never awaited by the outer scheduler.
    #[serde(default)]
    pub forever: bool,
}

fn default_shutdown_timeout() -> f64 {
    1.0
}

fn default_critical() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            jobs_window: 0,
            timeout_secs: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
            critical: default_critical(),
            label: None,
            forever: false,
        }
    }
}

impl SchedulerConfig {
    /// The global deadline as a `Duration`, if one is set.
    ///
    /// A zero or negative `timeout_secs` means "unbounded", like an absent one.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// The teardown grace period as a `Duration`.
    pub fn shutdown_timeout(&self) -> Duration {
        if self.shutdown_timeout_secs > 0.0 {
            Duration::from_secs_f64(self.shutdown_timeout_secs)
        } else {
            Duration::ZERO
        }
    }
}
