use std::path::{Path, PathBuf};

use pipedag::model::{Pipeline, Step};

/// Builder for `Pipeline` to simplify test setup.
///
/// Panics on any invariant violation; use the `Pipeline` methods directly
/// when a test wants to observe the error.
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            pipeline: Pipeline::new(name, "test"),
        }
    }

    pub fn with_owner(name: &str, owner: &str) -> Self {
        Self {
            pipeline: Pipeline::new(name, owner),
        }
    }

    pub fn resource(mut self, name: &str, path: impl AsRef<Path>) -> Self {
        self.pipeline
            .add_resource(name, path.as_ref())
            .expect("resource name must be unique");
        self
    }

    pub fn context(mut self, key: &str, value: &str) -> Self {
        self.pipeline
            .add_context(key, value)
            .expect("context key must be unique");
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.pipeline.add_step(step).expect("step must be valid");
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}

/// Builder for `Step`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            step: Step::new(name, command),
        }
    }

    pub fn input(mut self, resource: &str) -> Self {
        self.step.inputs.push(resource.to_string());
        self
    }

    pub fn output(mut self, resource: &str) -> Self {
        self.step.outputs.push(resource.to_string());
        self
    }

    pub fn context(mut self, key: &str, value: &str) -> Self {
        self.step.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}
