// src/model/run.rs

//! Execution records.
//!
//! Records are built once, when a step or run completes, and never mutated
//! afterwards. Each carries a generated id and a UTC timestamp.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PipedagError, Result};

fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Finished,
    Error,
}

/// Result of running one step locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRun {
    pub id: String,
    pub ran_at: DateTime<Utc>,
    pub step_name: String,
    pub outcome: Outcome,
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepRun {
    /// Record a finished process. Only exit code 0 counts as `finished`.
    pub fn from_exit(
        step_name: impl Into<String>,
        returncode: i32,
        stdout: String,
        stderr: String,
    ) -> Self {
        let outcome = if returncode == 0 {
            Outcome::Finished
        } else {
            Outcome::Error
        };
        Self {
            id: new_record_id(),
            ran_at: Utc::now(),
            step_name: step_name.into(),
            outcome,
            returncode,
            stdout,
            stderr,
        }
    }

    /// Record a step that failed before (or instead of) producing an exit
    /// code, e.g. a template error or a spawn failure.
    pub fn failed(step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_exit(step_name, -1, String::new(), message.into())
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Finished
    }
}

/// Result of running a whole pipeline locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: String,
    pub ran_at: DateTime<Utc>,
    pub pipeline_name: String,
    pub outcome: Outcome,
    #[serde(default)]
    pub step_runs: Vec<StepRun>,
}

impl PipelineRun {
    /// Seal a run. The outcome is `error` if any step errored.
    pub fn from_step_runs(
        pipeline_name: impl Into<String>,
        ran_at: DateTime<Utc>,
        step_runs: Vec<StepRun>,
    ) -> Self {
        let outcome = if step_runs.iter().all(StepRun::succeeded) {
            Outcome::Finished
        } else {
            Outcome::Error
        };
        Self {
            id: new_record_id(),
            ran_at,
            pipeline_name: pipeline_name.into(),
            outcome,
            step_runs,
        }
    }

    pub fn step_run(&self, step_name: &str) -> Option<&StepRun> {
        self.step_runs.iter().find(|r| r.step_name == step_name)
    }
}

/// Opaque job handle issued by the batch scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Parse raw scheduler output into a handle.
    ///
    /// Surrounding whitespace is dropped; an empty handle or one with inner
    /// whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipedagError::SubmitFailed(
                "scheduler returned an empty job handle".to_string(),
            ));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(PipedagError::SubmitFailed(format!(
                "scheduler returned a malformed job handle: {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One step handed to the batch scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub step_name: String,
    pub job_id: JobId,
    /// Handles of the step's direct predecessors.
    pub depends_on: Vec<JobId>,
    pub header_file: PathBuf,
}

/// Result of submitting a whole pipeline.
///
/// Holds job handles only; whether the jobs succeed is up to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRun {
    pub id: String,
    pub ran_at: DateTime<Utc>,
    pub pipeline_name: String,
    #[serde(default)]
    pub jobs: Vec<JobSubmission>,
}

impl SubmissionRun {
    pub fn new(
        pipeline_name: impl Into<String>,
        ran_at: DateTime<Utc>,
        jobs: Vec<JobSubmission>,
    ) -> Self {
        Self {
            id: new_record_id(),
            ran_at,
            pipeline_name: pipeline_name.into(),
            jobs,
        }
    }

    pub fn job_for(&self, step_name: &str) -> Option<&JobSubmission> {
        self.jobs.iter().find(|j| j.step_name == step_name)
    }
}
