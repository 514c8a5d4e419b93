// src/exec/local.rs

//! Sequential local execution.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::dag::{DagGraph, topological_order};
use crate::errors::Result;
use crate::exec::process::run_shell;
use crate::model::{Pipeline, PipelineRun, Step, StepRun};
use crate::template;

/// Runs a pipeline's steps one at a time on this machine.
///
/// Steps run in [`topological_order`]. Each child process is awaited before
/// the next starts, even when the graph would allow overlap. The first step
/// that errors (non-zero exit, template error, spawn failure, timeout) halts
/// the run; steps after it get no record at all.
#[derive(Debug, Clone, Default)]
pub struct LocalEngine {
    working_dir: Option<PathBuf>,
    step_timeout: Option<Duration>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory commands run in; defaults to the current one.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Kill and fail any step running longer than `timeout`.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Execute `pipeline`.
    ///
    /// Fails up front (running nothing) if the step graph has a cycle.
    /// Step failures are not errors here; they show up as the run outcome.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<PipelineRun> {
        let ran_at = Utc::now();
        let graph = DagGraph::build(pipeline)?;
        let order = topological_order(&graph);

        info!(
            pipeline = %pipeline.name(),
            steps = order.len(),
            ?order,
            "starting local run"
        );

        let mut step_runs = Vec::with_capacity(order.len());
        for name in &order {
            let step = pipeline.get_step(name)?;
            let step_run = self.run_step(pipeline, step).await;
            let failed = !step_run.succeeded();
            step_runs.push(step_run);

            if failed {
                warn!(step = %name, "step failed; halting pipeline");
                break;
            }
        }

        let run = PipelineRun::from_step_runs(pipeline.name(), ran_at, step_runs);
        info!(
            pipeline = %pipeline.name(),
            run_id = %run.id,
            outcome = ?run.outcome,
            steps_run = run.step_runs.len(),
            "local run finished"
        );
        Ok(run)
    }

    /// Render and run a single step, always producing a record.
    pub async fn run_step(&self, pipeline: &Pipeline, step: &Step) -> StepRun {
        let command = match template::render(&step.command, &pipeline.bindings_for(step)) {
            Ok(command) => command,
            Err(err) => {
                error!(step = %step.name, error = %err, "could not render step command");
                return StepRun::failed(&step.name, err.to_string());
            }
        };

        info!(step = %step.name, cmd = %command, "starting step process");

        match run_shell(&command, self.working_dir.as_deref(), self.step_timeout).await {
            Ok(output) => {
                info!(
                    step = %step.name,
                    exit_code = output.exit_code,
                    success = output.success(),
                    "step process exited"
                );
                StepRun::from_exit(&step.name, output.exit_code, output.stdout, output.stderr)
            }
            Err(err) => {
                error!(step = %step.name, error = %err, "step execution error");
                StepRun::failed(&step.name, format!("{err:#}"))
            }
        }
    }
}
