// src/submit/header.rs

//! PBS job header rendering.
//!
//! Header options are read from the pipeline context, then the step context
//! (later wins). Recognised keys and their defaults:
//!
//! | key                | default              |
//! |--------------------|----------------------|
//! | `shell`            | `/bin/sh`            |
//! | `job_name`         | the step's job stem  |
//! | `walltime`         | `04:00:00`           |
//! | `ncpus`            | `4`                  |
//! | `join`             | `oe`                 |
//! | `email`            | unset                |
//! | `notify`           | unset, needs `email` |
//! | `environment_name` | unset                |
//! | `extra_module`     | unset                |
//!
//! Any other context key is ignored here. An empty value counts as unset.
//! PBS rejects whitespace in `-N`, so a configured `job_name` has every run of
//! whitespace replaced by `_`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Pipeline, Step};
use crate::template::{self, TemplateError};

pub const DEFAULT_SHELL: &str = "/bin/sh";
pub const DEFAULT_WALLTIME: &str = "04:00:00";
pub const DEFAULT_NCPUS: &str = "4";
pub const DEFAULT_JOIN: &str = "oe";

/// Suffix of every header file written next to the submission.
pub const HEADER_SUFFIX: &str = ".header.pbs";

pub const HEADER_TEMPLATE: &str = r#"#!{{ shell }}
#PBS -S {{ shell }}
#PBS -N {{ job_name }}
#PBS -l walltime={{ walltime }}
#PBS -l ncpus={{ ncpus }}
#PBS -j {{ join }}
{{ mail_directives }}
# handle work dir
if [ -z "$PBS_O_WORKDIR" ]; then
    PBS_O_WORKDIR="$PWD"
fi
cd "$PBS_O_WORKDIR"

# load module
. /etc/profile.d/modules.sh
{{ environment_activation }}{{ module_load }}
{{ command }}
ret_code=$?
{{ environment_deactivation }}
exit $ret_code
"#;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").expect("slug pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Per-step PBS header settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    pub shell: String,
    /// `None` means "use the step's [`job_stem`]".
    pub job_name: Option<String>,
    pub walltime: String,
    pub ncpus: String,
    pub join: String,
    pub email: Option<String>,
    pub notify: Option<String>,
    pub environment_name: Option<String>,
    pub extra_module: Option<String>,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            job_name: None,
            walltime: DEFAULT_WALLTIME.to_string(),
            ncpus: DEFAULT_NCPUS.to_string(),
            join: DEFAULT_JOIN.to_string(),
            email: None,
            notify: None,
            environment_name: None,
            extra_module: None,
        }
    }
}

impl HeaderOptions {
    /// Resolve options for `step`: defaults, then pipeline context, then the
    /// step's own context.
    pub fn resolve(pipeline: &Pipeline, step: &Step) -> Self {
        let mut options = Self::default();
        for (key, value) in pipeline.context() {
            options.apply(key, value);
        }
        for (key, value) in &step.context {
            options.apply(key, value);
        }
        options
    }

    /// Set one option from a context entry. Unknown keys are ignored.
    pub fn apply(&mut self, key: &str, value: &str) {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match key {
            "shell" if !value.is_empty() => self.shell = value.to_string(),
            "walltime" if !value.is_empty() => self.walltime = value.to_string(),
            "ncpus" if !value.is_empty() => self.ncpus = value.to_string(),
            "join" if !value.is_empty() => self.join = value.to_string(),
            "job_name" => self.job_name = optional(),
            "email" => self.email = optional(),
            "notify" => self.notify = optional(),
            "environment_name" => self.environment_name = optional(),
            "extra_module" => self.extra_module = optional(),
            _ => {}
        }
    }

    /// Flat binding map for [`HEADER_TEMPLATE`].
    pub fn to_bindings(&self, step_name: &str, command: &str) -> BTreeMap<String, String> {
        let mail_directives = match (&self.email, &self.notify) {
            (Some(email), Some(notify)) => format!("#PBS -M {email}\n#PBS -m {notify}\n"),
            (Some(email), None) => format!("#PBS -M {email}\n"),
            (None, _) => String::new(),
        };

        let (environment_activation, environment_deactivation) = match &self.environment_name {
            Some(env) => (
                format!("\nmodule load python/miniconda\nconda activate {env}\n"),
                "\n# deactivate environment\nconda deactivate\n".to_string(),
            ),
            None => (String::new(), String::new()),
        };

        let module_load = self
            .extra_module
            .as_ref()
            .map(|m| format!("\nmodule load {m}\n"))
            .unwrap_or_default();

        BTreeMap::from([
            ("shell".to_string(), self.shell.clone()),
            (
                "job_name".to_string(),
                self.job_name
                    .as_deref()
                    .map(|name| WHITESPACE.replace_all(name, "_").into_owned())
                    .unwrap_or_else(|| job_stem(step_name)),
            ),
            ("walltime".to_string(), self.walltime.clone()),
            ("ncpus".to_string(), self.ncpus.clone()),
            ("join".to_string(), self.join.clone()),
            ("mail_directives".to_string(), mail_directives),
            ("environment_activation".to_string(), environment_activation),
            ("environment_deactivation".to_string(), environment_deactivation),
            ("module_load".to_string(), module_load),
            ("command".to_string(), command.to_string()),
        ])
    }
}

/// Render the full job header for a step whose command is already rendered.
pub fn render_header(
    options: &HeaderOptions,
    step_name: &str,
    command: &str,
) -> Result<String, TemplateError> {
    template::render(HEADER_TEMPLATE, &options.to_bindings(step_name, command))
}

/// Lower-case `name` and collapse every run of non-alphanumerics to `_`.
///
/// Letters and digits from any script are kept:
/// `"Step 1: Align reads"` -> `"step_1_align_reads"`, `"Βήτα"` -> `"βήτα"`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Slug used as a step's header file stem and default job name; `step` when
/// the name has no letters or digits at all.
pub fn job_stem(step_name: &str) -> String {
    let slug = slugify(step_name);
    if slug.is_empty() {
        "step".to_string()
    } else {
        slug
    }
}

/// Header file path for a stem: `<dir>/<stem>.header.pbs`.
pub fn header_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}{HEADER_SUFFIX}"))
}
