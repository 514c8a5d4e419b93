// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::errors::{PipedagError, Result};
use crate::model::Pipeline;

/// One producer -> consumer link, labelled with the resource that induced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub resource: &'a str,
}

/// Step dependency multigraph.
///
/// Nodes are step names, added in declaration order so a node's index is the
/// step's position in the pipeline. Edge direction: producer -> consumer.
/// Two steps sharing several resources get one parallel edge per resource.
///
/// A `DagGraph` is only ever handed out by [`DagGraph::build`], so holders can
/// rely on it being acyclic.
#[derive(Debug, Clone)]
pub struct DagGraph {
    graph: DiGraph<String, String>,
    index: HashMap<String, NodeIndex>,
}

impl DagGraph {
    /// Infer the step graph of `pipeline` and check it is acyclic.
    ///
    /// For every ordered pair of distinct steps, an edge is added for each
    /// output of the source that resolves to the same file as an input of
    /// the target. Resources are compared by path, so two resource names
    /// bound to the same path still link their steps.
    pub fn build(pipeline: &Pipeline) -> Result<Self> {
        let steps = pipeline.steps();
        let mut graph: DiGraph<String, String> = DiGraph::with_capacity(steps.len(), 0);
        let mut index = HashMap::with_capacity(steps.len());

        for step in steps {
            let node = graph.add_node(step.name.clone());
            index.insert(step.name.clone(), node);
        }

        for (s, source) in steps.iter().enumerate() {
            for (t, target) in steps.iter().enumerate() {
                if s == t {
                    continue;
                }
                for output in &source.outputs {
                    let Some(produced) = pipeline.resource_path(output) else {
                        continue;
                    };
                    for input in &target.inputs {
                        if pipeline.resource_path(input) == Some(produced) {
                            graph.add_edge(NodeIndex::new(s), NodeIndex::new(t), output.clone());
                        }
                    }
                }
            }
        }

        debug!(
            steps = graph.node_count(),
            edges = graph.edge_count(),
            "built step graph"
        );

        let dag = Self { graph, index };
        if let Some(path) = dag.find_cycle() {
            return Err(PipedagError::Cycle { path });
        }
        Ok(dag)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Step names in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|n| self.graph[n].as_str())
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = DagEdge<'_>> {
        self.graph.edge_references().map(|e| DagEdge {
            source: self.graph[e.source()].as_str(),
            target: self.graph[e.target()].as_str(),
            resource: e.weight().as_str(),
        })
    }

    /// Resources linking `source` to `target` (one per parallel edge).
    pub fn edges_between(&self, source: &str, target: &str) -> Result<Vec<&str>> {
        let s = self.node(source)?;
        let t = self.node(target)?;
        let mut resources: Vec<&str> = self
            .graph
            .edges_connecting(s, t)
            .map(|e| e.weight().as_str())
            .collect();
        resources.sort_unstable();
        Ok(resources)
    }

    /// Direct predecessors of `name`, deduplicated, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<&str>> {
        self.neighbours(name, Direction::Incoming)
    }

    /// Direct successors of `name`, deduplicated, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Result<Vec<&str>> {
        self.neighbours(name, Direction::Outgoing)
    }

    fn neighbours(&self, name: &str, dir: Direction) -> Result<Vec<&str>> {
        let node = self.node(name)?;
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(node, dir).collect();
        found.sort_unstable();
        found.dedup();
        Ok(found.into_iter().map(|n| self.graph[n].as_str()).collect())
    }

    pub(crate) fn node(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PipedagError::UnknownStep(name.to_string()))
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, String> {
        &self.graph
    }

    /// Depth-first search for a cycle, returned as `[a, b, ..., a]`.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit(
            graph: &DiGraph<String, String>,
            node: NodeIndex,
            marks: &mut [Mark],
            path: &mut Vec<NodeIndex>,
        ) -> Option<Vec<String>> {
            marks[node.index()] = Mark::Visiting;
            path.push(node);

            for next in graph.neighbors_directed(node, Direction::Outgoing) {
                match marks[next.index()] {
                    Mark::Visiting => {
                        let start = path.iter().position(|n| *n == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|n| graph[*n].clone()).collect();
                        cycle.push(graph[next].clone());
                        return Some(cycle);
                    }
                    Mark::Unvisited => {
                        if let Some(cycle) = visit(graph, next, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }

            path.pop();
            marks[node.index()] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if marks[node.index()] == Mark::Unvisited {
                if let Some(cycle) = visit(&self.graph, node, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}
