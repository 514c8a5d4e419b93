// src/submit/mod.rs

//! Batch scheduler submission.
//!
//! - [`header`] renders the per-step PBS job header and names its file.
//! - [`backend`] provides the `BatchScheduler` trait and the `qsub`-backed
//!   `PbsScheduler`; tests can substitute a fake.
//! - [`engine`] walks the step graph and submits each step with a dependency
//!   on its direct predecessors' jobs.

pub mod backend;
pub mod engine;
pub mod header;

pub use backend::{BatchScheduler, PbsScheduler, depend_clause};
pub use engine::SubmitEngine;
pub use header::{HeaderOptions, header_path, job_stem, render_header, slugify};
