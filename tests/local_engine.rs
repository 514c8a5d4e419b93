// tests/local_engine.rs

mod common;

use std::fs;
use std::time::Duration;

use common::{TestResult, init_tracing, split_merge, with_timeout};
use pipedag::exec::LocalEngine;
use pipedag::model::Outcome;
use pipedag_test_utils::builders::{PipelineBuilder, StepBuilder, write_file};

#[tokio::test]
async fn split_merge_runs_to_completion() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let (pipeline, files) = split_merge(dir.path());

    let run = with_timeout(LocalEngine::new().run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Finished);
    assert_eq!(run.pipeline_name, "split merge");

    let names: Vec<&str> = run.step_runs.iter().map(|r| r.step_name.as_str()).collect();
    assert_eq!(names, vec!["step 1", "step 2", "step 3"]);
    assert!(run.step_runs.iter().all(|r| r.returncode == 0));

    assert_eq!(fs::read_to_string(&files.b)?, "abc");
    assert_eq!(fs::read_to_string(&files.c)?, "abc");
    assert_eq!(fs::read_to_string(&files.d)?, "abcabc");

    let d = pipeline.resource("d").expect("d is declared");
    assert!(d.exists());
    assert_eq!(d.read_to_string()?, "abcabc");
    Ok(())
}

#[tokio::test]
async fn failing_step_halts_the_run() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let after = dir.path().join("after.txt");

    let pipeline = PipelineBuilder::new("halts")
        .resource("after", &after)
        .step(StepBuilder::new("first", "echo first").build())
        .step(StepBuilder::new("boom", "echo oops >&2; exit 3").build())
        .step(
            StepBuilder::new("later", "echo later > {{ after }}")
                .output("after")
                .build(),
        )
        .build();

    let run = with_timeout(LocalEngine::new().run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Error);
    assert_eq!(run.step_runs.len(), 2);

    let first = run.step_run("first").expect("first ran");
    assert_eq!(first.outcome, Outcome::Finished);
    assert_eq!(first.stdout.trim(), "first");

    let boom = run.step_run("boom").expect("boom ran");
    assert_eq!(boom.outcome, Outcome::Error);
    assert_eq!(boom.returncode, 3);
    assert_eq!(boom.stderr.trim(), "oops");

    assert!(run.step_run("later").is_none());
    assert!(!after.exists());
    Ok(())
}

#[tokio::test]
async fn missing_template_key_fails_the_step() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("marker");

    let pipeline = PipelineBuilder::new("missing key")
        .step(StepBuilder::new("broken", "echo {{ nowhere }}").build())
        .step(StepBuilder::new("never", &format!("touch {}", marker.display())).build())
        .build();

    let run = with_timeout(LocalEngine::new().run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Error);
    assert_eq!(run.step_runs.len(), 1);

    let broken = &run.step_runs[0];
    assert_eq!(broken.returncode, -1);
    assert!(broken.stderr.contains("nowhere"), "stderr: {}", broken.stderr);
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn context_is_layered_into_commands() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let out = dir.path().join("greeting.txt");

    let pipeline = PipelineBuilder::new("context")
        .resource("out", &out)
        .context("greeting", "hello")
        .context("who", "world")
        .step(
            StepBuilder::new("greet", "echo {{ greeting }} {{ who }} > {{ out }}")
                .output("out")
                .context("who", "pipedag")
                .build(),
        )
        .build();

    let run = with_timeout(LocalEngine::new().run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Finished);
    assert_eq!(fs::read_to_string(&out)?.trim(), "hello pipedag");
    Ok(())
}

#[tokio::test]
async fn slow_step_is_killed_after_timeout() -> TestResult {
    init_tracing();

    let pipeline = PipelineBuilder::new("slow")
        .step(StepBuilder::new("sleepy", "sleep 5").build())
        .build();

    let engine = LocalEngine::new().with_step_timeout(Some(Duration::from_millis(200)));
    let run = with_timeout(engine.run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Error);
    let sleepy = &run.step_runs[0];
    assert_eq!(sleepy.returncode, -1);
    assert!(sleepy.stderr.contains("timed out"), "stderr: {}", sleepy.stderr);
    Ok(())
}

#[tokio::test]
async fn independent_steps_run_in_declaration_order() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let log = write_file(dir.path(), "log.txt", "");
    let append = |n: u32| format!("echo {n} >> {}", log.display());

    let pipeline = PipelineBuilder::new("sequential")
        .step(StepBuilder::new("step 1", &append(1)).build())
        .step(StepBuilder::new("step 2", &append(2)).build())
        .step(StepBuilder::new("step 3", &append(3)).build())
        .build();

    let run = with_timeout(LocalEngine::new().run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Finished);
    assert_eq!(fs::read_to_string(&log)?, "1\n2\n3\n");
    Ok(())
}

#[tokio::test]
async fn working_dir_applies_to_every_step() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let pipeline = PipelineBuilder::new("cwd")
        .step(StepBuilder::new("write", "echo here > relative.txt").build())
        .build();

    let engine = LocalEngine::new().with_working_dir(dir.path());
    let run = with_timeout(engine.run(&pipeline)).await?;

    assert_eq!(run.outcome, Outcome::Finished);
    assert_eq!(fs::read_to_string(dir.path().join("relative.txt"))?.trim(), "here");
    Ok(())
}
