// src/model/mod.rs

//! In-memory data model.
//!
//! - [`pipeline`] holds the pipeline itself: the shared resource/context
//!   namespace and the ordered step list.
//! - [`step`] defines a single unit of work.
//! - [`run`] holds the records produced by executing or submitting a
//!   pipeline.

pub mod pipeline;
pub mod run;
pub mod step;

pub use pipeline::{Binding, Pipeline, Resource};
pub use run::{JobId, JobSubmission, Outcome, PipelineRun, StepRun, SubmissionRun};
pub use step::Step;
