// tests/dag_order.rs

mod common;

use std::collections::BTreeSet;

use common::{TestResult, init_tracing, split_merge};
use pipedag::dag::{DagGraph, ancestors, descendants, topological_order};
use pipedag::errors::PipedagError;
use pipedag_test_utils::builders::{PipelineBuilder, StepBuilder};

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn independent_steps_keep_declaration_order() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("independent")
        .step(StepBuilder::new("step 1", "echo 1").build())
        .step(StepBuilder::new("step 2", "echo 2").build())
        .step(StepBuilder::new("step 3", "echo 3").build())
        .build();

    let graph = DagGraph::build(&pipeline)?;
    assert_eq!(graph.edges().count(), 0);
    assert_eq!(
        topological_order(&graph),
        vec!["step 1", "step 2", "step 3"]
    );
    Ok(())
}

#[test]
fn consumer_declared_first_still_runs_last() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("reversed")
        .resource("x", "x.txt")
        .step(
            StepBuilder::new("consume", "cat {{ x }}")
                .input("x")
                .build(),
        )
        .step(
            StepBuilder::new("produce", "touch {{ x }}")
                .output("x")
                .build(),
        )
        .build();

    let graph = DagGraph::build(&pipeline)?;
    assert_eq!(topological_order(&graph), vec!["produce", "consume"]);
    Ok(())
}

#[test]
fn split_merge_orders_producers_first() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (pipeline, _) = split_merge(dir.path());
    let graph = DagGraph::build(&pipeline)?;

    assert_eq!(graph.len(), 3);
    assert_eq!(
        topological_order(&graph),
        vec!["step 1", "step 2", "step 3"]
    );

    assert_eq!(graph.dependencies_of("step 3")?, vec!["step 1", "step 2"]);
    assert_eq!(graph.dependents_of("step 1")?, vec!["step 3"]);
    assert!(graph.dependencies_of("step 1")?.is_empty());

    assert_eq!(graph.edges_between("step 1", "step 3")?, vec!["b"]);
    assert_eq!(graph.edges_between("step 2", "step 3")?, vec!["c"]);
    assert!(graph.edges_between("step 1", "step 2")?.is_empty());
    Ok(())
}

#[test]
fn shared_resources_produce_parallel_edges() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("multi")
        .resource("left", "left.txt")
        .resource("right", "right.txt")
        .step(
            StepBuilder::new("split", "split")
                .output("left")
                .output("right")
                .build(),
        )
        .step(
            StepBuilder::new("join", "join {{ left }} {{ right }}")
                .input("left")
                .input("right")
                .build(),
        )
        .build();

    let graph = DagGraph::build(&pipeline)?;
    assert_eq!(graph.edges().count(), 2);
    assert_eq!(graph.edges_between("split", "join")?, vec!["left", "right"]);

    // Parallel edges collapse to a single dependency.
    assert_eq!(graph.dependencies_of("join")?, vec!["split"]);
    assert_eq!(topological_order(&graph), vec!["split", "join"]);
    Ok(())
}

#[test]
fn step_reading_its_own_output_has_no_self_edge() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("in place")
        .resource("log", "log.txt")
        .step(
            StepBuilder::new("append", "echo more >> {{ log }}")
                .input("log")
                .output("log")
                .build(),
        )
        .build();

    let graph = DagGraph::build(&pipeline)?;
    assert_eq!(graph.edges().count(), 0);
    assert_eq!(topological_order(&graph), vec!["append"]);
    Ok(())
}

#[test]
fn resources_are_matched_by_path_not_name() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("aliases")
        .resource("written", "shared/data.csv")
        .resource("read", "shared/data.csv")
        .step(
            StepBuilder::new("reader", "wc -l {{ read }}")
                .input("read")
                .build(),
        )
        .step(
            StepBuilder::new("writer", "seq 10 > {{ written }}")
                .output("written")
                .build(),
        )
        .build();

    let graph = DagGraph::build(&pipeline)?;
    let edges: Vec<_> = graph.edges().collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, "writer");
    assert_eq!(edges[0].target, "reader");
    assert_eq!(edges[0].resource, "written");

    assert_eq!(topological_order(&graph), vec!["writer", "reader"]);
    Ok(())
}

#[test]
fn ancestors_and_descendants_are_transitive() -> TestResult {
    init_tracing();

    // a -> b -> c, and an unrelated d
    let pipeline = PipelineBuilder::new("chain")
        .resource("r1", "r1")
        .resource("r2", "r2")
        .step(StepBuilder::new("a", "a").output("r1").build())
        .step(StepBuilder::new("b", "b").input("r1").output("r2").build())
        .step(StepBuilder::new("c", "c").input("r2").build())
        .step(StepBuilder::new("d", "d").build())
        .build();

    let graph = DagGraph::build(&pipeline)?;

    assert_eq!(ancestors(&graph, "c")?, set(&["a", "b"]));
    assert_eq!(ancestors(&graph, "a")?, set(&[]));
    assert_eq!(descendants(&graph, "a")?, set(&["b", "c"]));
    assert_eq!(descendants(&graph, "d")?, set(&[]));

    // Only the direct predecessor counts as a dependency.
    assert_eq!(graph.dependencies_of("c")?, vec!["b"]);
    Ok(())
}

#[test]
fn unknown_step_lookups_fail() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (pipeline, _) = split_merge(dir.path());
    let graph = DagGraph::build(&pipeline)?;

    assert!(!graph.contains("step 9"));
    assert!(matches!(
        graph.dependencies_of("step 9"),
        Err(PipedagError::UnknownStep(name)) if name == "step 9"
    ));
    assert!(matches!(
        ancestors(&graph, "nope"),
        Err(PipedagError::UnknownStep(_))
    ));
    assert!(matches!(
        graph.edges_between("step 1", "nope"),
        Err(PipedagError::UnknownStep(_))
    ));
    Ok(())
}

#[test]
fn empty_pipeline_has_empty_order() -> TestResult {
    let pipeline = PipelineBuilder::new("empty").build();
    let graph = DagGraph::build(&pipeline)?;

    assert!(graph.is_empty());
    assert!(topological_order(&graph).is_empty());
    Ok(())
}
