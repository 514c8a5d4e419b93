// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::JobSubmission;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum PipedagError {
    /// The step graph inferred from resource usage is not acyclic.
    ///
    /// `path` is one offending cycle, first node repeated at the end.
    #[error("Cycle detected in step DAG: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Step not found: {0}")]
    UnknownStep(String),

    #[error("step '{step}' references unknown resource '{resource}'")]
    UnknownResource { step: String, resource: String },

    #[error("key '{0}' is already in use by a resource or context entry")]
    DuplicateKey(String),

    #[error("a step named '{0}' already exists")]
    DuplicateStep(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("could not persist pipeline to {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("job submission failed: {0}")]
    SubmitFailed(String),

    /// Submission stopped part-way. Jobs in `submitted` are already queued
    /// in the external scheduler and are not withdrawn.
    #[error(
        "submission aborted at step '{step}' with {} job(s) already queued: {source}",
        .submitted.len()
    )]
    SubmitAborted {
        step: String,
        submitted: Vec<JobSubmission>,
        #[source]
        source: Box<PipedagError>,
    },
}

pub type Result<T> = std::result::Result<T, PipedagError>;
