// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Pipeline, Step};

/// Pipeline file as read from / written to TOML, before validation.
///
/// ```toml
/// name = "split merge"
/// owner = "alice"
/// created = "2026-10-15T09:30:00Z"
///
/// [resources]
/// a = "data/a.txt"
/// b = "data/b.txt"
///
/// [context]
/// greeting = "hello"
///
/// [[steps]]
/// name = "copy"
/// inputs = ["a"]
/// outputs = ["b"]
/// command = "cp {{ a }} {{ b }}"
/// ```
///
/// Nothing here is checked: resource/context keys may clash and steps may
/// point at unknown resources. Convert with `Pipeline::try_from` to get a
/// validated pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPipeline {
    pub name: String,

    pub owner: String,

    /// Creation time; a missing value is filled in with "now" on load.
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    /// `[resources]`: resource name -> file path.
    #[serde(default)]
    pub resources: BTreeMap<String, PathBuf>,

    /// `[context]`: shared key -> value pairs available to every command.
    #[serde(default)]
    pub context: BTreeMap<String, String>,

    /// `[[steps]]`, in declaration order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl From<&Pipeline> for RawPipeline {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            name: pipeline.name().to_string(),
            owner: pipeline.owner().to_string(),
            created: pipeline.created(),
            resources: pipeline
                .resources()
                .map(|r| (r.name.to_string(), r.path.to_path_buf()))
                .collect(),
            context: pipeline
                .context()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            steps: pipeline.steps().to_vec(),
        }
    }
}
