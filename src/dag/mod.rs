// src/dag/mod.rs

//! Step dependency graph and execution ordering.
//!
//! - [`graph`] infers the step DAG from resource producer/consumer pairs and
//!   rejects cycles.
//! - [`order`] computes the deterministic execution order and transitive
//!   ancestor/descendant queries.

pub mod graph;
pub mod order;

pub use graph::{DagEdge, DagGraph};
pub use order::{ancestors, descendants, topological_order};
