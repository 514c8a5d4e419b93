// src/submit/engine.rs

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::dag::{DagGraph, topological_order};
use crate::errors::{PipedagError, Result};
use crate::model::{JobId, JobSubmission, Pipeline, SubmissionRun};
use crate::submit::backend::BatchScheduler;
use crate::submit::header::{HeaderOptions, header_path, job_stem, render_header};
use crate::template;

/// Submits every step of a pipeline to a batch scheduler.
///
/// Steps are submitted in [`topological_order`]. Each job is told to wait
/// for the jobs of the step's *direct* predecessors only; the scheduler's
/// own `afterok` chaining covers the rest. Submission does not wait for any
/// job to run.
pub struct SubmitEngine<S> {
    scheduler: S,
    header_dir: PathBuf,
}

impl<S: BatchScheduler> SubmitEngine<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            header_dir: PathBuf::from("."),
        }
    }

    /// Directory job headers are written to (created if missing).
    pub fn with_header_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.header_dir = dir.into();
        self
    }

    /// Submit `pipeline`.
    ///
    /// Cycles are reported before anything is submitted. Any later failure stops submission; jobs queued so far are
    /// listed in [`PipedagError::SubmitAborted`] since they cannot be pulled
    /// back.
    pub async fn submit(&mut self, pipeline: &Pipeline) -> Result<SubmissionRun> {
        let ran_at = Utc::now();
        let graph = DagGraph::build(pipeline)?;
        let order = topological_order(&graph);
        let headers = self.plan_headers(pipeline);

        fs::create_dir_all(&self.header_dir).map_err(|source| PipedagError::Persistence {
            path: self.header_dir.clone(),
            source,
        })?;

        info!(
            pipeline = %pipeline.name(),
            steps = order.len(),
            ?order,
            "submitting pipeline"
        );

        let mut job_ids: HashMap<&str, JobId> = HashMap::new();
        let mut jobs: Vec<JobSubmission> = Vec::with_capacity(order.len());

        for name in &order {
            match self
                .submit_step(pipeline, &graph, name, &headers, &job_ids)
                .await
            {
                Ok(job) => {
                    job_ids.insert(name.as_str(), job.job_id.clone());
                    jobs.push(job);
                }
                Err(source) => {
                    error!(step = %name, error = %source, "submission failed; aborting");
                    if !jobs.is_empty() {
                        let queued: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
                        warn!(?queued, "jobs already queued remain in the scheduler");
                    }
                    return Err(PipedagError::SubmitAborted {
                        step: name.clone(),
                        submitted: jobs,
                        source: Box::new(source),
                    });
                }
            }
        }

        let run = SubmissionRun::new(pipeline.name(), ran_at, jobs);
        info!(
            pipeline = %pipeline.name(),
            run_id = %run.id,
            jobs = run.jobs.len(),
            "pipeline submitted"
        );
        Ok(run)
    }

    async fn submit_step(
        &mut self,
        pipeline: &Pipeline,
        graph: &DagGraph,
        name: &str,
        headers: &HashMap<&str, PathBuf>,
        job_ids: &HashMap<&str, JobId>,
    ) -> Result<JobSubmission> {
        let step = pipeline.get_step(name)?;

        // Topological order guarantees every predecessor already has a job.
        let depends_on = graph
            .dependencies_of(name)?
            .into_iter()
            .map(|dep| {
                job_ids
                    .get(dep)
                    .cloned()
                    .ok_or_else(|| PipedagError::UnknownStep(dep.to_string()))
            })
            .collect::<Result<Vec<JobId>>>()?;

        let command = template::render(&step.command, &pipeline.bindings_for(step))?;
        let options = HeaderOptions::resolve(pipeline, step);
        let header = render_header(&options, &step.name, &command)?;

        let header_file = headers
            .get(name)
            .cloned()
            .ok_or_else(|| PipedagError::UnknownStep(name.to_string()))?;
        fs::write(&header_file, header).map_err(|source| PipedagError::Persistence {
            path: header_file.clone(),
            source,
        })?;
        info!(step = %name, header = ?header_file, "wrote job header");

        let job_id = self.scheduler.submit(&header_file, &depends_on).await?;
        info!(step = %name, job_id = %job_id, depends_on = ?depends_on, "submitted job");

        Ok(JobSubmission {
            step_name: step.name.clone(),
            job_id,
            depends_on,
            header_file,
        })
    }

    /// Header path per step, unique within the pipeline.
    ///
    /// Steps keep their [`job_stem`] in declaration order; a step whose stem
    /// is already taken gets its 1-based declaration position appended
    /// (`step_1_2`), counting upwards until the name is free.
    fn plan_headers<'p>(&self, pipeline: &'p Pipeline) -> HashMap<&'p str, PathBuf> {
        let mut taken: HashSet<String> = HashSet::new();
        let mut headers = HashMap::with_capacity(pipeline.steps().len());

        for (pos, step) in pipeline.steps().iter().enumerate() {
            let base = job_stem(&step.name);
            let mut stem = base.clone();
            let mut n = pos + 1;
            while taken.contains(&stem) {
                stem = format!("{base}_{n}");
                n += 1;
            }
            if stem != base {
                debug!(step = %step.name, %base, %stem, "header name taken; using suffix");
            }
            headers.insert(step.name.as_str(), header_path(&self.header_dir, &stem));
            taken.insert(stem);
        }
        headers
    }
}
