// tests/cycle_detection.rs

mod common;

use common::{TestResult, init_tracing, split_merge, with_timeout};
use pipedag::config::validate_dag;
use pipedag::dag::DagGraph;
use pipedag::errors::PipedagError;
use pipedag::exec::LocalEngine;
use pipedag::model::{Pipeline, Step};
use pipedag_test_utils::builders::{PipelineBuilder, StepBuilder};

fn cycle_path(result: Result<DagGraph, PipedagError>) -> Vec<String> {
    match result {
        Err(PipedagError::Cycle { path }) => path,
        Err(other) => panic!("expected a cycle error, got {other}"),
        Ok(_) => panic!("expected a cycle error, graph built fine"),
    }
}

fn ping_pong() -> Pipeline {
    PipelineBuilder::new("ping pong")
        .resource("x", "x.txt")
        .resource("y", "y.txt")
        .step(StepBuilder::new("ping", "ping").input("y").output("x").build())
        .step(StepBuilder::new("pong", "pong").input("x").output("y").build())
        .build()
}

#[test]
fn two_step_cycle_is_reported_with_its_path() {
    init_tracing();

    let path = cycle_path(DagGraph::build(&ping_pong()));

    assert_eq!(path.first(), path.last());
    assert_eq!(path.len(), 3);
    assert!(path.contains(&"ping".to_string()));
    assert!(path.contains(&"pong".to_string()));
}

#[test]
fn merge_step_feeding_back_into_source_is_a_cycle() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (mut pipeline, _) = split_merge(dir.path());

    let mut step = Step::new("step 4", "cp {{ d }} {{ a }}");
    step.inputs.push("d".into());
    step.outputs.push("a".into());
    pipeline.add_step(step)?;

    let path = cycle_path(DagGraph::build(&pipeline));
    assert_eq!(path.first(), path.last());
    assert!(path.contains(&"step 4".to_string()));
    assert!(path.contains(&"step 3".to_string()));

    let err = validate_dag(&pipeline).unwrap_err();
    assert!(err.to_string().contains("Cycle detected"));
    Ok(())
}

#[tokio::test]
async fn local_engine_refuses_cyclic_pipeline() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");

    let mut pipeline = ping_pong();
    pipeline.add_step(Step::new("marker", format!("touch {}", marker.display())))?;

    let result = with_timeout(LocalEngine::new().run(&pipeline)).await;

    assert!(matches!(result, Err(PipedagError::Cycle { .. })));
    assert!(!marker.exists(), "no step may run when the graph has a cycle");
    Ok(())
}
