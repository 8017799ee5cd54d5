// src/dot.rs

//! Graph export in DOT format.
//!
//! Produces a directed-graph description of a scheduler tree, suitable
//! for post-processing with graphviz's `dot` utility. Plain jobs are
//! rounded boxes, nested schedulers are `cluster` subgraphs with sharp
//! corners, critical nodes get a thick red border, forever nodes a
//! dashed one. Edges represent "depends-on" and point from the dependent
//! to its prerequisite, clipped at cluster boundaries when either end is
//! a nested scheduler.

use std::fmt::Write as _;

use crate::errors::{JobdagError, Result};
use crate::job::JobRef;
use crate::listing::assign_ranks;
use crate::scheduler::PureScheduler;

/// Render the scheduler tree as a DOT digraph.
pub fn dot_format(sched: &PureScheduler) -> Result<String> {
    assign_ranks(sched)?;
    let mut out = String::from("digraph jobdag {\ncompound=true;\n");
    dot_members(sched, &mut out)?;
    out.push_str("}\n");
    Ok(out)
}

fn rank_of(job: &JobRef) -> String {
    job.core().sched_id().unwrap_or_else(|| "??".to_string())
}

fn node_name(job: &JobRef) -> String {
    format!("job_{}", rank_of(job))
}

fn cluster_name(job: &JobRef) -> String {
    format!("cluster_{}", rank_of(job))
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn node_attrs(job: &JobRef, default_critical: bool) -> String {
    let mut styles = vec!["rounded"];
    if job.is_forever() {
        styles.push("dashed");
    }
    let mut attrs = format!(
        "label=\"{}: {}\", shape=box, style=\"{}\"",
        rank_of(job),
        escape(&job.label()),
        styles.join(","),
    );
    if job.is_critical(default_critical) {
        attrs.push_str(", color=red, penwidth=2");
    } else {
        attrs.push_str(", penwidth=0.5");
    }
    attrs
}

/// Nodes, clusters and edges of one scheduler's members.
fn dot_members(sched: &PureScheduler, out: &mut String) -> Result<()> {
    let default_critical = sched.is_critical();

    for job in sched.topological_order()? {
        match job.as_scheduler() {
            None => {
                let _ = writeln!(
                    out,
                    "{} [{}]",
                    node_name(&job),
                    node_attrs(&job, default_critical)
                );
            }
            Some(nested) => {
                // schedulers keep sharp corners; only the frame is styled
                let _ = writeln!(out, "subgraph {} {{", cluster_name(&job));
                let _ = writeln!(out, "label=\"{}: {}\";", rank_of(&job), escape(&job.label()));
                if job.is_critical(default_critical) {
                    out.push_str("color=red;\npenwidth=2;\n");
                }
                if job.is_forever() {
                    out.push_str("style=dashed;\n");
                }
                dot_members(nested, out)?;
                out.push_str("}\n");
            }
        }
        for req in job.core().required_jobs() {
            out.push_str(&edge_line(&job, &req)?);
        }
    }
    Ok(())
}

/// One requirement edge, from the dependent to its prerequisite,
/// anchored and clipped when either end is a cluster.
fn edge_line(dependent: &JobRef, prereq: &JobRef) -> Result<String> {
    let (tail, ltail) = match dependent.as_scheduler() {
        Some(nested) => (entry_anchor(nested)?, Some(cluster_name(dependent))),
        None => (dependent.clone(), None),
    };
    let (head, lhead) = match prereq.as_scheduler() {
        Some(nested) => (exit_anchor(nested)?, Some(cluster_name(prereq))),
        None => (prereq.clone(), None),
    };

    let mut attrs: Vec<String> = Vec::new();
    if let Some(ltail) = ltail {
        attrs.push(format!("ltail={ltail}"));
    }
    if let Some(lhead) = lhead {
        attrs.push(format!("lhead={lhead}"));
    }
    Ok(if attrs.is_empty() {
        format!("{} -> {};\n", node_name(&tail), node_name(&head))
    } else {
        format!(
            "{} -> {} [{}];\n",
            node_name(&tail),
            node_name(&head),
            attrs.join(" ")
        )
    })
}

/// The node an edge attaches to when the endpoint is a nested scheduler:
/// a plain job near the middle of its entry (resp. exit) gate.
fn entry_anchor(sched: &PureScheduler) -> Result<JobRef> {
    let entries = sched.entry_jobs();
    if entries.is_empty() {
        return Err(JobdagError::NoEntryPoint(sched.scope_label()));
    }
    let anchor = entries[(entries.len() - 1) / 2].clone();
    match anchor.as_scheduler() {
        Some(nested) => entry_anchor(nested),
        None => Ok(anchor),
    }
}

fn exit_anchor(sched: &PureScheduler) -> Result<JobRef> {
    let mut exits = sched.exit_jobs(true);
    if exits.is_empty() {
        // second chance: allow forever jobs as exits
        exits = sched.exit_jobs(false);
    }
    if exits.is_empty() {
        return Err(JobdagError::NoEntryPoint(sched.scope_label()));
    }
    let anchor = exits[(exits.len() - 1) / 2].clone();
    match anchor.as_scheduler() {
        Some(nested) => exit_anchor(nested),
        None => Ok(anchor),
    }
}
