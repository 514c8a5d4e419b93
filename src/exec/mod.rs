// src/exec/mod.rs

//! Local execution layer.
//!
//! - [`process`] spawns shell commands with `tokio::process::Command` and
//!   buffers their output.
//! - [`local`] provides [`LocalEngine`], which drives a whole pipeline
//!   through `process` in dependency order.

pub mod local;
pub mod process;

pub use local::LocalEngine;
pub use process::{CommandOutput, run_shell};
