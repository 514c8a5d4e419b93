// src/submit/backend.rs

//! Pluggable batch scheduler abstraction.
//!
//! The submission engine talks to a `BatchScheduler` instead of spawning
//! `qsub` itself, so tests can swap in a fake that hands out job ids without
//! a cluster.
//!
//! - [`PbsScheduler`] is the production implementation. It shells out to
//!   `qsub` (or a configured replacement) and reads the job id from stdout.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::debug;

use crate::errors::{PipedagError, Result};
use crate::exec::process::run_shell;
use crate::model::JobId;
use crate::template;

/// Submission command line; `depends` may render empty.
pub const SUBMIT_TEMPLATE: &str = "{{ program }} {{ depends }} {{ header_file }}";

/// Trait abstracting how a job header is handed to the batch system.
pub trait BatchScheduler: Send {
    /// Submit the job described by `header`, to start only after every job
    /// in `depends_on` has finished successfully. Returns the new job's
    /// handle.
    fn submit<'a>(
        &'a mut self,
        header: &'a Path,
        depends_on: &'a [JobId],
    ) -> Pin<Box<dyn Future<Output = Result<JobId>> + Send + 'a>>;
}

/// PBS dependency clause: `-W depend=afterok:<id>:<id>...`, or empty when
/// there is nothing to wait for.
pub fn depend_clause(depends_on: &[JobId]) -> String {
    if depends_on.is_empty() {
        return String::new();
    }
    let ids: Vec<&str> = depends_on.iter().map(JobId::as_str).collect();
    format!("-W depend=afterok:{}", ids.join(":"))
}

/// Quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Real scheduler backend used in production.
#[derive(Debug, Clone)]
pub struct PbsScheduler {
    program: String,
    working_dir: Option<PathBuf>,
}

impl Default for PbsScheduler {
    fn default() -> Self {
        Self::new("qsub")
    }
}

impl PbsScheduler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full submission command line for one job.
    pub fn command_line(&self, header: &Path, depends_on: &[JobId]) -> Result<String> {
        let bindings = [
            ("program".to_string(), self.program.clone()),
            ("depends".to_string(), depend_clause(depends_on)),
            (
                "header_file".to_string(),
                shell_quote(&header.to_string_lossy()),
            ),
        ]
        .into_iter()
        .collect();

        Ok(template::render(SUBMIT_TEMPLATE, &bindings)?.trim().to_string())
    }
}

impl BatchScheduler for PbsScheduler {
    fn submit<'a>(
        &'a mut self,
        header: &'a Path,
        depends_on: &'a [JobId],
    ) -> Pin<Box<dyn Future<Output = Result<JobId>> + Send + 'a>> {
        Box::pin(async move {
            let command_line = self.command_line(header, depends_on)?;
            debug!(cmd = %command_line, "invoking scheduler");

            let output = run_shell(&command_line, self.working_dir.as_deref(), None)
                .await
                .map_err(|err| PipedagError::SubmitFailed(format!("{err:#}")))?;
            if !output.success() {
                return Err(PipedagError::SubmitFailed(format!(
                    "`{command_line}` exited with code {}: {}",
                    output.exit_code,
                    output.stderr.trim()
                )));
            }

            JobId::parse(&output.stdout)
        })
    }
}
