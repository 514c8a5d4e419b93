// src/config/validate.rs

use crate::config::model::RawPipeline;
use crate::dag::DagGraph;
use crate::errors::{PipedagError, Result};
use crate::model::Pipeline;

impl TryFrom<RawPipeline> for Pipeline {
    type Error = PipedagError;

    /// Validate a raw pipeline file.
    ///
    /// Checks:
    /// - `name` and `owner` are non-empty
    /// - no key appears in both `[resources]` and `[context]`
    /// - step names are unique and commands non-empty
    /// - every step input/output names a declared resource
    ///
    /// The step graph is *not* checked for cycles here so that a cyclic
    /// pipeline can still be loaded and repaired; see [`validate_dag`].
    fn try_from(raw: RawPipeline) -> std::result::Result<Self, Self::Error> {
        ensure_non_empty("name", &raw.name)?;
        ensure_non_empty("owner", &raw.owner)?;

        let mut pipeline = Pipeline::with_created(raw.name, raw.owner, raw.created);
        pipeline.add_resources(raw.resources)?;
        pipeline.add_context_entries(raw.context)?;
        for step in raw.steps {
            pipeline.add_step(step)?;
        }

        Ok(pipeline)
    }
}

fn ensure_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipedagError::InvalidPipeline(format!(
            "pipeline `{field}` must not be empty"
        )));
    }
    Ok(())
}

/// Check that the inferred step graph is acyclic.
pub fn validate_dag(pipeline: &Pipeline) -> Result<()> {
    DagGraph::build(pipeline).map(|_| ())
}
