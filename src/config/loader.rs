// src/config/loader.rs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::model::RawPipeline;
use crate::errors::{PipedagError, Result};
use crate::model::Pipeline;

/// Read a pipeline file and return the raw, unvalidated [`RawPipeline`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipeline> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| PipedagError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawPipeline = toml::from_str(&contents)?;

    Ok(raw)
}

/// Read and validate a pipeline file.
///
/// This is the entry point the rest of the crate uses.
pub fn load(path: impl AsRef<Path>) -> Result<Pipeline> {
    let raw = load_from_path(&path)?;
    let pipeline = Pipeline::try_from(raw)?;
    debug!(
        path = ?path.as_ref(),
        pipeline = %pipeline.name(),
        steps = pipeline.steps().len(),
        "loaded pipeline"
    );
    Ok(pipeline)
}

/// Write a pipeline file.
///
/// The document is serialized up front and written to a temporary file next
/// to `path`, synced, then renamed over `path`. If any stage fails the
/// temporary file is removed and whatever was at `path` is left untouched.
pub fn save(pipeline: &Pipeline, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let contents = toml::to_string_pretty(&RawPipeline::from(pipeline))?;

    let persistence = |source: std::io::Error| PipedagError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(parent_dir(path)).map_err(persistence)?;
    tmp.write_all(contents.as_bytes()).map_err(persistence)?;
    tmp.as_file().sync_all().map_err(persistence)?;
    tmp.persist(path).map_err(|e| persistence(e.error))?;

    debug!(path = ?path, pipeline = %pipeline.name(), "saved pipeline");
    Ok(())
}

/// Directory that holds `path`, `.` for a bare file name.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Default pipeline file: `Pipedag.toml` in the current working directory.
pub fn default_pipeline_path() -> PathBuf {
    PathBuf::from("Pipedag.toml")
}
