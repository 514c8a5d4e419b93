// src/model/step.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named unit of work inside a pipeline.
///
/// Mirrors one `[[steps]]` entry of the pipeline file:
///
/// ```toml
/// [[steps]]
/// name = "merge"
/// inputs = ["b", "c"]
/// outputs = ["d"]
/// command = "cat {{ b }} {{ c }} > {{ d }}"
/// ```
///
/// Inputs and outputs are resource *names*; the paths live in the owning
/// pipeline's resource table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Unique within the owning pipeline.
    pub name: String,

    /// Resources this step reads.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Resources this step writes.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Shell command template, rendered with `{{ key }}` placeholders.
    pub command: String,

    /// Private key/value context, layered over the pipeline context when the
    /// command is rendered.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Step {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            command: command.into(),
            context: BTreeMap::new(),
        }
    }

    /// All resource names this step touches, inputs first.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|s| s.as_str())
    }
}
