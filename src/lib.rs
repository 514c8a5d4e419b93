// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod model;
pub mod submit;
pub mod template;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, CreateArgs, EditAction, RunArgs, SchedulerKind};
use crate::config::{load, save, validate_dag};
use crate::dag::{DagGraph, topological_order};
use crate::exec::LocalEngine;
use crate::model::{Outcome, Pipeline, Step};
use crate::submit::{PbsScheduler, SubmitEngine};

/// High-level entry point used by `main.rs`.
///
/// Dispatches the `create`, `edit` and `run` verbs against the pipeline file
/// named by `--file`.
pub async fn run(args: CliArgs) -> Result<()> {
    let path = args.file.as_path();
    match args.command {
        Command::Create(create) => create_pipeline(path, create),
        Command::Edit { action } => edit_pipeline(path, action),
        Command::Run(run_args) => run_pipeline(path, run_args).await,
    }
}

fn create_pipeline(path: &Path, args: CreateArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!(
            "pipeline file {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let pipeline = Pipeline::new(args.name, args.owner);
    save(&pipeline, path)?;
    info!(path = ?path, pipeline = %pipeline.name(), "created pipeline");
    Ok(())
}

fn edit_pipeline(path: &Path, action: EditAction) -> Result<()> {
    let mut pipeline =
        load(path).with_context(|| format!("loading pipeline from {}", path.display()))?;

    match action {
        EditAction::AddResource { name, path: resource } => {
            pipeline.add_resource(name, resource)?;
        }
        EditAction::AddContext { key, value } => {
            pipeline.add_context(key, value)?;
        }
        EditAction::AddStep {
            name,
            command,
            inputs,
            outputs,
            context,
        } => {
            pipeline.add_step(Step {
                name,
                inputs,
                outputs,
                command,
                context: context.into_iter().collect(),
            })?;
            // Refuse to persist a pipeline that can no longer be ordered.
            validate_dag(&pipeline)?;
        }
        EditAction::RemoveStep { name } => {
            let removed = pipeline.remove_step(&name)?;
            debug!(step = %removed.name, "removed step");
        }
    }

    save(&pipeline, path)?;
    info!(path = ?path, pipeline = %pipeline.name(), "updated pipeline");
    Ok(())
}

async fn run_pipeline(path: &Path, args: RunArgs) -> Result<()> {
    let pipeline =
        load(path).with_context(|| format!("loading pipeline from {}", path.display()))?;

    if args.dry_run {
        print_dry_run(&pipeline)?;
        return Ok(());
    }

    match args.scheduler {
        SchedulerKind::Local => {
            let engine = LocalEngine::new().with_step_timeout(args.timeout.map(Duration::from_secs));
            let run = engine.run(&pipeline).await?;
            println!("{}", toml::to_string_pretty(&run)?);

            if run.outcome == Outcome::Error {
                let failed = run
                    .step_runs
                    .last()
                    .map(|r| r.step_name.as_str())
                    .unwrap_or("<none>");
                bail!("pipeline '{}' failed at step '{failed}'", pipeline.name());
            }
        }
        SchedulerKind::Pbs => {
            if args.timeout.is_some() {
                bail!("--timeout only applies to the local scheduler");
            }
            let mut engine =
                SubmitEngine::new(PbsScheduler::new(args.qsub)).with_header_dir(args.header_dir);
            let submission = engine.submit(&pipeline).await?;
            println!("{}", toml::to_string_pretty(&submission)?);
        }
    }

    Ok(())
}

/// Dry-run output: execution order, dependency edges and rendered commands.
fn print_dry_run(pipeline: &Pipeline) -> Result<()> {
    let graph = DagGraph::build(pipeline)?;
    let order = topological_order(&graph);

    println!("pipedag dry-run");
    println!("  pipeline = {}", pipeline.name());
    println!("  owner = {}", pipeline.owner());
    println!("  created = {}", pipeline.created().to_rfc3339());
    println!();

    println!("execution order ({}):", order.len());
    for (i, name) in order.iter().enumerate() {
        let step = pipeline.get_step(name)?;
        println!("  {}. {name}", i + 1);

        for dep in graph.dependencies_of(name)? {
            let via = graph.edges_between(dep, name)?;
            println!("      after: {dep} (via {})", via.join(", "));
        }

        let bindings = pipeline.bindings_for(step);
        match template::missing_keys(&step.command, &bindings) {
            Ok(missing) if !missing.is_empty() => {
                println!("      cmd: <unresolved: {}>", missing.join(", "));
            }
            Ok(_) => match template::render(&step.command, &bindings) {
                Ok(cmd) => println!("      cmd: {cmd}"),
                Err(err) => println!("      cmd: <{err}>"),
            },
            Err(err) => println!("      cmd: <{err}>"),
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
