// src/dag/order.rs

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::{Dfs, EdgeRef, Reversed};

use crate::dag::graph::DagGraph;
use crate::errors::Result;

/// Deterministic execution order (Kahn's algorithm).
///
/// Every edge `a -> b` places `a` before `b`. When several steps are ready at
/// once, the one declared first in the pipeline goes first, so a pipeline of
/// independent steps runs in declaration order.
pub fn topological_order(dag: &DagGraph) -> Vec<String> {
    let graph = dag.inner();

    // One count per edge, so parallel edges are released one at a time.
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.edges_directed(n, Direction::Incoming).count())
        .collect();

    // Min-heap on node index == declaration index.
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(Reverse(i)) = ready.pop() {
        let node = NodeIndex::new(i);
        order.push(graph[node].clone());

        for edge in graph.edges_directed(node, Direction::Outgoing) {
            let target = edge.target().index();
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                ready.push(Reverse(target));
            }
        }
    }

    debug_assert_eq!(order.len(), graph.node_count(), "DagGraph must be acyclic");
    order
}

/// Every step `name` depends on, directly or transitively.
pub fn ancestors(dag: &DagGraph, name: &str) -> Result<BTreeSet<String>> {
    let start = dag.node(name)?;
    let reversed = Reversed(dag.inner());

    let mut dfs = Dfs::new(reversed, start);
    let mut found = BTreeSet::new();
    while let Some(node) = dfs.next(reversed) {
        if node != start {
            found.insert(dag.inner()[node].clone());
        }
    }
    Ok(found)
}

/// Every step that depends on `name`, directly or transitively.
pub fn descendants(dag: &DagGraph, name: &str) -> Result<BTreeSet<String>> {
    let start = dag.node(name)?;
    let graph = dag.inner();

    let mut dfs = Dfs::new(graph, start);
    let mut found = BTreeSet::new();
    while let Some(node) = dfs.next(graph) {
        if node != start {
            found.insert(graph[node].clone());
        }
    }
    Ok(found)
}
