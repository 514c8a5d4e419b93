// src/model/pipeline.rs

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::{PipedagError, Result};
use crate::model::step::Step;

/// One entry of the shared "known keys" namespace.
///
/// Resources and context values live in the same map, so a name can never be
/// both a resource and a context key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Resource(PathBuf),
    Context(String),
}

/// Read-only view of a resource table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource<'a> {
    pub name: &'a str,
    pub path: &'a Path,
}

impl Resource<'_> {
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(self.path)
    }
}

/// A named, owned collection of resources, context and ordered steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: String,
    owner: String,
    created: DateTime<Utc>,
    bindings: BTreeMap<String, Binding>,
    steps: Vec<Step>,
}

impl Pipeline {
    /// Create an empty pipeline stamped with the current time.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::with_created(name, owner, Utc::now())
    }

    pub fn with_created(
        name: impl Into<String>,
        owner: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            created,
            bindings: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Insert a binding, failing if `name` is already known as either a
    /// resource or a context key.
    pub fn add_unique(&mut self, name: impl Into<String>, binding: Binding) -> Result<()> {
        match self.bindings.entry(name.into()) {
            Entry::Occupied(entry) => Err(PipedagError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(key = %entry.key(), ?binding, "adding binding");
                entry.insert(binding);
                Ok(())
            }
        }
    }

    pub fn add_resource(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Result<()> {
        self.add_unique(name, Binding::Resource(path.into()))
    }

    pub fn add_context(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.add_unique(key, Binding::Context(value.into()))
    }

    /// Add several resources at once.
    ///
    /// Either every entry is inserted or none is: a clash with an existing
    /// key, or a name repeated inside `resources`, leaves the tables as they
    /// were.
    pub fn add_resources<I, K, P>(&mut self, resources: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PathBuf>,
    {
        self.add_all(
            resources
                .into_iter()
                .map(|(k, p)| (k.into(), Binding::Resource(p.into()))),
        )
    }

    /// Add several context entries at once, with the same all-or-nothing
    /// behaviour as [`Pipeline::add_resources`].
    pub fn add_context_entries<I, K, V>(&mut self, context: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.add_all(
            context
                .into_iter()
                .map(|(k, v)| (k.into(), Binding::Context(v.into()))),
        )
    }

    fn add_all(&mut self, entries: impl Iterator<Item = (String, Binding)>) -> Result<()> {
        let entries: Vec<(String, Binding)> = entries.collect();

        let mut seen = BTreeSet::new();
        for (name, _) in &entries {
            if self.bindings.contains_key(name) || !seen.insert(name.as_str()) {
                return Err(PipedagError::DuplicateKey(name.clone()));
            }
        }

        self.bindings.extend(entries);
        Ok(())
    }

    /// Append a step.
    ///
    /// The step name must be new, every input/output must name a resource
    /// (not a context key) already in the table, and no key of the step's
    /// private context may name a resource.
    pub fn add_step(&mut self, step: Step) -> Result<()> {
        if self.steps.iter().any(|s| s.name == step.name) {
            return Err(PipedagError::DuplicateStep(step.name));
        }
        if step.command.trim().is_empty() {
            return Err(PipedagError::InvalidPipeline(format!(
                "step '{}' has an empty command",
                step.name
            )));
        }
        if let Some(missing) = step.resources().find(|r| self.resource_path(r).is_none()) {
            return Err(PipedagError::UnknownResource {
                step: step.name.clone(),
                resource: missing.to_string(),
            });
        }
        // A private value may shadow pipeline context, never a resource path.
        if let Some(key) = step.context.keys().find(|k| self.resource(k).is_some()) {
            return Err(PipedagError::DuplicateKey(key.clone()));
        }

        debug!(step = %step.name, "adding step");
        self.steps.push(step);
        Ok(())
    }

    /// Remove a step by name, returning it.
    pub fn remove_step(&mut self, name: &str) -> Result<Step> {
        let pos = self
            .steps
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| PipedagError::UnknownStep(name.to_string()))?;
        Ok(self.steps.remove(pos))
    }

    pub fn get_step(&self, name: &str) -> Result<&Step> {
        self.steps
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| PipedagError::UnknownStep(name.to_string()))
    }

    /// Resource table, ordered by name.
    pub fn resources(&self) -> impl Iterator<Item = Resource<'_>> {
        self.bindings.iter().filter_map(|(name, binding)| match binding {
            Binding::Resource(path) => Some(Resource {
                name: name.as_str(),
                path: path.as_path(),
            }),
            Binding::Context(_) => None,
        })
    }

    pub fn resource(&self, name: &str) -> Option<Resource<'_>> {
        self.bindings
            .get_key_value(name)
            .and_then(|(name, binding)| match binding {
                Binding::Resource(path) => Some(Resource {
                    name: name.as_str(),
                    path: path.as_path(),
                }),
                Binding::Context(_) => None,
            })
    }

    pub fn resource_path(&self, name: &str) -> Option<&Path> {
        self.resource(name).map(|r| r.path)
    }

    /// Context table, ordered by key.
    pub fn context(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().filter_map(|(key, binding)| match binding {
            Binding::Context(value) => Some((key.as_str(), value.as_str())),
            Binding::Resource(_) => None,
        })
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        match self.bindings.get(key)? {
            Binding::Context(value) => Some(value.as_str()),
            Binding::Resource(_) => None,
        }
    }

    /// Flat namespace a step's command is rendered against: every resource
    /// path, the pipeline context, then the step's own context on top.
    pub fn bindings_for(&self, step: &Step) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = self
            .bindings
            .iter()
            .map(|(name, binding)| {
                let value = match binding {
                    Binding::Resource(path) => path.to_string_lossy().into_owned(),
                    Binding::Context(value) => value.clone(),
                };
                (name.clone(), value)
            })
            .collect();

        out.extend(
            step.context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        out
    }
}
