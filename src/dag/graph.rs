// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{JobdagError, Result};
use crate::job::{JobId, JobRef};

/// Adjacency snapshot over a scheduler's job set.
///
/// Built from the jobs' `required` edges, restricted to the member set:
/// a requirement pointing at a job that is not a member is simply not an
/// edge here (that is what `sanitize` warns about and drops). Insertion
/// order of the member list is preserved everywhere, which is what makes
/// the linearization and all returned sets deterministic.
pub struct GraphView {
    jobs: Vec<JobRef>,
    index: HashMap<JobId, usize>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl GraphView {
    /// Two-pass build: index the members, then populate both adjacency
    /// directions from the `required` lists.
    pub fn new(jobs: &[JobRef]) -> Self {
        let index: HashMap<JobId, usize> = jobs
            .iter()
            .enumerate()
            .map(|(pos, job)| (job.id(), pos))
            .collect();

        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); jobs.len()];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); jobs.len()];

        for (pos, job) in jobs.iter().enumerate() {
            for req in job.core().required_jobs() {
                if let Some(&req_pos) = index.get(&req.id()) {
                    preds[pos].push(req_pos);
                    succs[req_pos].push(pos);
                }
            }
        }

        Self {
            jobs: jobs.to_vec(),
            index,
            preds,
            succs,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[JobRef] {
        &self.jobs
    }

    fn positions_of(&self, starts: &[JobRef]) -> Vec<usize> {
        starts
            .iter()
            .filter_map(|job| self.index.get(&job.id()).copied())
            .collect()
    }

    fn collect_sorted(&self, mut positions: Vec<usize>) -> Vec<JobRef> {
        positions.sort_unstable();
        positions.dedup();
        positions.iter().map(|&pos| self.jobs[pos].clone()).collect()
    }

    /// One-step neighbours along the given adjacency, as a deduplicated
    /// set in member order.
    fn neighbours(&self, adjacency: &[Vec<usize>], starts: &[JobRef]) -> Vec<JobRef> {
        let mut found = Vec::new();
        for pos in self.positions_of(starts) {
            found.extend(adjacency[pos].iter().copied());
        }
        self.collect_sorted(found)
    }

    /// Transitive closure along the given adjacency, excluding the starts
    /// themselves unless reachable.
    fn closure(&self, adjacency: &[Vec<usize>], starts: &[JobRef]) -> Vec<JobRef> {
        let mut seen = vec![false; self.jobs.len()];
        let mut stack = self.positions_of(starts);
        let mut found = Vec::new();

        while let Some(pos) = stack.pop() {
            for &next in &adjacency[pos] {
                if !seen[next] {
                    seen[next] = true;
                    found.push(next);
                    stack.push(next);
                }
            }
        }
        self.collect_sorted(found)
    }

    /// Jobs that any of `starts` directly requires.
    pub fn predecessors(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.neighbours(&self.preds, starts)
    }

    /// Jobs that directly require any of `starts`.
    pub fn successors(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.neighbours(&self.succs, starts)
    }

    /// Everything any of `starts` depends on, immediately or further up.
    pub fn predecessors_upstream(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.closure(&self.preds, starts)
    }

    /// Everything that depends on any of `starts`, immediately or further
    /// down.
    pub fn successors_downstream(&self, starts: &[JobRef]) -> Vec<JobRef> {
        self.closure(&self.succs, starts)
    }

    /// Jobs with no prerequisite inside this set.
    pub fn entry_jobs(&self) -> Vec<JobRef> {
        (0..self.jobs.len())
            .filter(|&pos| self.preds[pos].is_empty())
            .map(|pos| self.jobs[pos].clone())
            .collect()
    }

    /// Jobs that nothing inside this set requires.
    ///
    /// Forever jobs often have no successors but are seldom of interest
    /// as exits; `discard_forever` skips them.
    pub fn exit_jobs(&self, discard_forever: bool) -> Vec<JobRef> {
        (0..self.jobs.len())
            .filter(|&pos| self.succs[pos].is_empty())
            .filter(|&pos| !(discard_forever && self.jobs[pos].is_forever()))
            .map(|pos| self.jobs[pos].clone())
            .collect()
    }

    /// True iff the member edges form a DAG.
    ///
    /// This only looks at this set; recursion into nested schedulers is
    /// the scheduler's business.
    pub fn check_cycles(&self) -> bool {
        let mut graph: DiGraphMap<JobId, ()> = DiGraphMap::new();
        for job in &self.jobs {
            graph.add_node(job.id());
        }
        for (pos, job) in self.jobs.iter().enumerate() {
            for &req_pos in &self.preds[pos] {
                graph.add_edge(self.jobs[req_pos].id(), job.id(), ());
            }
        }
        toposort(&graph, None).is_ok()
    }

    /// A stable linearization: repeatedly emit, in member order, every job
    /// whose prerequisites have all been emitted.
    ///
    /// Deterministic for a given member list; ties are broken by insertion
    /// order. Fails with [`JobdagError::CycleDetected`] when no progress
    /// can be made.
    pub fn topological_order(&self) -> Result<Vec<JobRef>> {
        let n = self.jobs.len();
        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while order.len() < n {
            let mut progressed = false;
            for pos in 0..n {
                if emitted[pos] {
                    continue;
                }
                if self.preds[pos].iter().all(|&req| emitted[req]) {
                    emitted[pos] = true;
                    order.push(self.jobs[pos].clone());
                    progressed = true;
                }
            }
            if !progressed {
                let stuck: Vec<String> = (0..n)
                    .filter(|&pos| !emitted[pos])
                    .map(|pos| self.jobs[pos].label())
                    .collect();
                return Err(JobdagError::CycleDetected(stuck.join(", ")));
            }
        }
        Ok(order)
    }
}
