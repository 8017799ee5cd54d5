// src/listing.rs

//! Textual rendering of a scheduler: `list`, `list_safe`, `debrief`.
//!
//! One line per job, in topological order:
//! rank, badges (critical / exception / lifecycle / forever), label,
//! outcome, and the ranks of the requirements. Nested schedulers are
//! rendered as an indented block between their own line and an `--end--`
//! marker.
//!
//! Badge alphabet:
//! - critical: `!` (critical) or space
//! - exception: `:(` raised, `:)` running fine, blank otherwise
//! - lifecycle: `>` idle, `.` scheduled, `o` running, `x` done
//! - forever: `8` or space

use std::fmt::Write as _;

use crate::errors::Result;
use crate::job::{JobRef, JobValue, Outcome};
use crate::scheduler::PureScheduler;

/// Total node count of a scheduler tree: a plain job counts for 1, a
/// nested scheduler for 1 plus its own count.
fn count_nodes(jobs: &[JobRef]) -> usize {
    jobs.iter()
        .map(|job| 1 + job.as_scheduler().map_or(0, |nested| count_nodes(&nested.jobs())))
        .sum()
}

/// Write topological ranks into every job of the tree, zero-padded to the
/// width of the total node count. A nested scheduler takes one rank for
/// itself, then its members are numbered right after it.
pub(crate) fn assign_ranks(sched: &PureScheduler) -> Result<()> {
    let total = count_nodes(&sched.jobs());
    let width = total.max(1).to_string().len();
    assign_ranks_from(sched, 1, width)?;
    Ok(())
}

fn assign_ranks_from(sched: &PureScheduler, start: usize, width: usize) -> Result<usize> {
    let mut next = start;
    for job in sched.topological_order()? {
        job.core().set_sched_id(Some(format!("{next:0width$}")));
        next += 1;
        if let Some(nested) = job.as_scheduler() {
            next = assign_ranks_from(nested, next, width)?;
        }
    }
    Ok(next)
}

/// Positional numbering that works on cyclic graphs: `1`, `2`, ... at the
/// top level, `3.1`, `3.2`, ... inside the nested scheduler ranked `3`.
fn assign_safe_ids(sched: &PureScheduler, prefix: &str) {
    for (i, job) in sched.jobs().iter().enumerate() {
        let id = if prefix.is_empty() {
            format!("{}", i + 1)
        } else {
            format!("{prefix}.{}", i + 1)
        };
        job.core().set_sched_id(Some(id.clone()));
        if let Some(nested) = job.as_scheduler() {
            assign_safe_ids(nested, &id);
        }
    }
}

fn badge(job: &JobRef, default_critical: bool) -> String {
    let crit = if job.is_critical(default_critical) { "!" } else { " " };
    let boom = if job.raised_exception().is_some() {
        ":("
    } else if job.is_running() && !job.is_done() {
        ":)"
    } else {
        "  "
    };
    let life = if job.is_done() {
        "x"
    } else if job.is_running() {
        "o"
    } else if job.is_scheduled() {
        "."
    } else {
        ">"
    };
    let forever = if job.is_forever() { "8" } else { " " };
    format!("{crit} {boom} {life} {forever}")
}

fn repr_main(job: &JobRef) -> String {
    format!("<{} `{}`>", job.type_label(), job.label())
}

fn repr_result(job: &JobRef, default_critical: bool) -> String {
    if let Some(err) = job.raised_exception() {
        let tag = if job.is_critical(default_critical) {
            "CRIT. EXC."
        } else {
            "exception"
        };
        return format!("!! {tag} => {err:#} !!");
    }
    match job.outcome() {
        Some(Outcome::Value(value)) => format!("[[ -> {}]]", fmt_value(&value)),
        Some(Outcome::Cancelled) => "[cancelled]".to_string(),
        _ => "[not done]".to_string(),
    }
}

/// Render common primitive result types; anything else is opaque.
fn fmt_value(value: &JobValue) -> String {
    if value.downcast_ref::<()>().is_some() {
        return "()".to_string();
    }
    if let Some(v) = value.downcast_ref::<String>() {
        return v.clone();
    }
    if let Some(v) = value.downcast_ref::<&'static str>() {
        return (*v).to_string();
    }
    if let Some(v) = value.downcast_ref::<bool>() {
        return v.to_string();
    }
    macro_rules! try_number {
        ($($ty:ty),*) => {
            $(if let Some(v) = value.downcast_ref::<$ty>() {
                return v.to_string();
            })*
        };
    }
    try_number!(i32, i64, u32, u64, usize, f32, f64);
    "<value>".to_string()
}

fn repr_requires(job: &JobRef) -> String {
    let required = job.core().required_jobs();
    if required.is_empty() {
        return String::new();
    }
    let ids: Vec<String> = required
        .iter()
        .map(|req| req.core().sched_id().unwrap_or_else(|| "??".to_string()))
        .collect();
    format!("requires={{{}}}", ids.join(", "))
}

fn id_csv(jobs: &[JobRef]) -> String {
    let ids: Vec<String> = jobs
        .iter()
        .map(|job| job.core().sched_id().unwrap_or_else(|| "??".to_string()))
        .collect();
    format!("{{{}}}", ids.join(", "))
}

/// Topologically-ordered listing of the whole scheduler tree.
pub(crate) fn list(sched: &PureScheduler) -> Result<String> {
    assign_ranks(sched)?;
    let mut out = String::new();
    list_into(sched, 0, &mut out)?;
    Ok(out)
}

fn list_into(sched: &PureScheduler, depth: usize, out: &mut String) -> Result<()> {
    let default_critical = sched.is_critical();
    let indent = if depth > 0 {
        format!("{} ", ">".repeat(depth))
    } else {
        String::new()
    };

    for job in sched.topological_order()? {
        let id = job.core().sched_id().unwrap_or_else(|| "??".to_string());
        match job.as_scheduler() {
            None => {
                let _ = writeln!(
                    out,
                    "{id} {} {indent}{} {} {}",
                    badge(&job, default_critical),
                    repr_main(&job),
                    repr_result(&job, default_critical),
                    repr_requires(&job),
                );
            }
            Some(nested) => {
                let _ = writeln!(
                    out,
                    "{id} {} {indent}{} {} {} -> entries={}",
                    badge(&job, default_critical),
                    repr_main(&job),
                    repr_result(&job, default_critical),
                    repr_requires(&job),
                    id_csv(&nested.entry_jobs()),
                );
                list_into(nested, depth + 1, out)?;
                let _ = writeln!(
                    out,
                    "{id} --end-- {} {} exits={}",
                    "<".repeat(depth + 1),
                    repr_main(&job),
                    id_csv(&nested.exit_jobs(true)),
                );
            }
        }
    }
    Ok(())
}

/// Listing that tolerates cyclic graphs: positional numbering, insertion
/// order, no topological information.
pub(crate) fn list_safe(sched: &PureScheduler) -> String {
    assign_safe_ids(sched, "");
    let mut out = String::new();
    list_safe_into(sched, &mut out);
    out
}

fn list_safe_into(sched: &PureScheduler, out: &mut String) {
    let default_critical = sched.is_critical();
    for job in sched.jobs() {
        let id = job.core().sched_id().unwrap_or_else(|| "??".to_string());
        let _ = writeln!(
            out,
            "{} {id} {} {}",
            badge(&job, default_critical),
            repr_main(&job),
            repr_requires(&job),
        );
        if let Some(nested) = job.as_scheduler() {
            list_safe_into(nested, out);
            let _ = writeln!(out, "--end-- {id}");
        }
    }
}

/// Post-mortem report: verdict, census, listing, and exception details
/// with critical ones first.
pub(crate) fn debrief(sched: &PureScheduler) -> Result<String> {
    let default_critical = sched.is_critical();
    let jobs = sched.jobs();

    let mut out = String::new();
    let _ = writeln!(out, "----- {}", sched.why());
    let _ = writeln!(out, "scheduler has {} ({} jobs total)", sched.stats(), jobs.len());
    out.push_str(&list(sched)?);

    let raised: Vec<JobRef> = jobs
        .iter()
        .filter(|job| job.raised_exception().is_some())
        .cloned()
        .collect();
    if raised.is_empty() {
        return Ok(out);
    }

    let criticals = raised
        .iter()
        .filter(|job| job.is_critical(default_critical))
        .count();
    let _ = writeln!(
        out,
        "===== {} job(s) with an exception, including {} critical",
        raised.len(),
        criticals
    );
    for job in raised.iter().filter(|job| job.is_critical(default_critical)) {
        if let Some(err) = job.raised_exception() {
            let _ = writeln!(out, "CRITICAL {}: {err:#}", job.label());
        }
    }
    for job in raised.iter().filter(|job| !job.is_critical(default_critical)) {
        if let Some(err) = job.raised_exception() {
            let _ = writeln!(out, "non-critical {}: {err:#}", job.label());
        }
    }
    Ok(out)
}
