// src/config/mod.rs

//! Persisted pipeline file.
//!
//! Responsibilities:
//! - Define the TOML-backed raw data model (`model.rs`).
//! - Turn a raw model into a validated [`Pipeline`](crate::model::Pipeline)
//!   and back (`validate.rs`).
//! - Read and atomically write the file (`loader.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_pipeline_path, load, load_from_path, save};
pub use model::RawPipeline;
pub use validate::validate_dag;
