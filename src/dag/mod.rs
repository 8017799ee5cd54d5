// src/dag/mod.rs

//! Requirement-graph analyses.
//!
//! [`graph`] builds an adjacency snapshot over a scheduler's job set and
//! provides the topological machinery: cycle detection, stable
//! linearization, neighbour queries and their transitive closures, and
//! entry/exit detection. The pruning operations that *mutate* the graph
//! (`sanitize`, `bypass_and_remove`, ...) live on the scheduler itself,
//! which owns the job set.

pub mod graph;

pub use graph::GraphView;
