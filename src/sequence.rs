// src/sequence.rs

//! Linear chains of jobs.
//!
//! A [`Sequence`] is a syntactic convenience: constructing one wires a
//! `requires` edge between each job and its predecessor, and that is all.
//! Sequences carry no runtime state and the scheduler never sees them;
//! only the member jobs matter.

use crate::job::{JobRef, Schedulable};

/// An ordered chain of jobs: each member requires the previous one.
///
/// Sequences nest: inserting a sequence inside another one splices its
/// jobs into the chain, wiring the inner head to the outer predecessor
/// and the next outer element to the inner tail.
#[derive(Clone, Default)]
pub struct Sequence {
    jobs: Vec<JobRef>,
}

impl Sequence {
    /// Build a sequence from jobs and/or nested sequences, in order, and
    /// wire the chain edges.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Schedulable>,
    {
        let jobs = Schedulable::flatten(items);
        for pair in jobs.windows(2) {
            pair[1].core().add_requirement(&pair[0]);
        }
        Self { jobs }
    }

    /// Same as [`Sequence::new`] for call sites holding concrete `Arc`
    /// handles of mixed flavors.
    pub fn chain<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schedulable>,
    {
        Self::new(items.into_iter().map(Into::into))
    }

    /// The member jobs, in chain order.
    pub fn jobs(&self) -> &[JobRef] {
        &self.jobs
    }

    /// The first job of the chain.
    pub fn head(&self) -> Option<&JobRef> {
        self.jobs.first()
    }

    /// The job a requirement on this sequence resolves to.
    pub fn tail(&self) -> Option<&JobRef> {
        self.jobs.last()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Append jobs or sequences at the end of the chain, wiring the new
    /// head to the current tail.
    pub fn append<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Schedulable>,
    {
        let new_jobs = Schedulable::flatten(items);
        if new_jobs.is_empty() {
            return;
        }
        if let Some(tail) = self.jobs.last() {
            new_jobs[0].core().add_requirement(tail);
        }
        for pair in new_jobs.windows(2) {
            pair[1].core().add_requirement(&pair[0]);
        }
        self.jobs.extend(new_jobs);
    }

    /// Add a prerequisite to the whole chain, i.e. to its head job.
    pub fn requires(&self, req: impl Into<Schedulable>) -> &Self {
        if let Some(head) = self.jobs.first() {
            if let Some(tail) = req.into().requirement_tail() {
                head.core().add_requirement(&tail);
            }
        }
        self
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self.jobs.iter().map(|job| job.label()).collect();
        f.debug_tuple("Sequence").field(&labels).finish()
    }
}

impl FromIterator<Schedulable> for Sequence {
    fn from_iter<I: IntoIterator<Item = Schedulable>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<JobRef>> for Sequence {
    fn from(jobs: Vec<JobRef>) -> Self {
        Self::new(jobs.into_iter().map(Schedulable::Job))
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a JobRef;
    type IntoIter = std::slice::Iter<'a, JobRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}
