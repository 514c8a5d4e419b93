// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::default_pipeline_path;

/// Command-line arguments for `pipedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipedag",
    version,
    about = "Describe file-based workflows as steps and run them in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    #[arg(
        long,
        short,
        global = true,
        value_name = "PATH",
        env = "PIPEDAG_FILE",
        default_value_os_t = default_pipeline_path()
    )]
    pub file: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a new, empty pipeline file.
    Create(CreateArgs),

    /// Modify an existing pipeline file.
    Edit {
        #[command(subcommand)]
        action: EditAction,
    },

    /// Execute the pipeline locally or submit it to a batch scheduler.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Pipeline name.
    #[arg(long)]
    pub name: String,

    /// Pipeline owner (you).
    #[arg(long)]
    pub owner: String,

    /// Overwrite an existing pipeline file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EditAction {
    /// Bind a resource name to a file path.
    AddResource { name: String, path: PathBuf },

    /// Add a shared context value.
    AddContext { key: String, value: String },

    /// Append a step.
    AddStep {
        name: String,

        /// Command template, e.g. "cp {{ a }} {{ b }}".
        #[arg(long)]
        command: String,

        /// Input resource name (repeatable).
        #[arg(long = "input", value_name = "RESOURCE")]
        inputs: Vec<String>,

        /// Output resource name (repeatable).
        #[arg(long = "output", value_name = "RESOURCE")]
        outputs: Vec<String>,

        /// Step-private context entry (repeatable).
        #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        context: Vec<(String, String)>,
    },

    /// Remove a step by name.
    RemoveStep { name: String },
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Where to run.
    #[arg(long, value_enum, default_value_t = SchedulerKind::Local)]
    pub scheduler: SchedulerKind,

    /// Print order, edges and rendered commands without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Kill and fail a local step after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory for PBS job headers.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub header_dir: PathBuf,

    /// Submission program used by the PBS scheduler.
    #[arg(long, value_name = "PROGRAM", default_value = "qsub")]
    pub qsub: String,
}

/// Execution backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum SchedulerKind {
    /// Run steps one by one on this machine.
    Local,
    /// Submit each step as a PBS job.
    Pbs,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
