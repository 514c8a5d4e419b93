use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use pipedag::errors::{PipedagError, Result};
use pipedag::model::JobId;
use pipedag::submit::BatchScheduler;

/// One recorded call to [`FakeScheduler::submit`].
#[derive(Debug, Clone)]
pub struct SubmitCall {
    pub header: PathBuf,
    pub header_contents: String,
    pub depends_on: Vec<JobId>,
    pub job_id: Option<JobId>,
}

/// A fake batch scheduler that:
/// - records every submission (header path, contents, dependencies)
/// - hands out sequential job ids `1.fake`, `2.fake`, ...
/// - optionally fails the Nth call (1-based) to exercise abort handling.
#[derive(Debug, Clone, Default)]
pub struct FakeScheduler {
    calls: Arc<Mutex<Vec<SubmitCall>>>,
    fail_on_call: Option<usize>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(n: usize) -> Self {
        Self {
            calls: Arc::default(),
            fail_on_call: Some(n),
        }
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> Vec<SubmitCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded call for the header whose file name starts with `slug`.
    pub fn call_for(&self, slug: &str) -> Option<SubmitCall> {
        self.calls().into_iter().find(|c| {
            c.header
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&format!("{slug}.")))
        })
    }

    fn record(&self, header: &Path, depends_on: &[JobId]) -> Result<JobId> {
        let header_contents = fs::read_to_string(header)?;
        let mut calls = self.calls.lock().unwrap();
        let n = calls.len() + 1;

        let job_id = if self.fail_on_call == Some(n) {
            None
        } else {
            Some(JobId::parse(&format!("{n}.fake\n"))?)
        };

        calls.push(SubmitCall {
            header: header.to_path_buf(),
            header_contents,
            depends_on: depends_on.to_vec(),
            job_id: job_id.clone(),
        });

        job_id.ok_or_else(|| PipedagError::SubmitFailed(format!("fake failure on call {n}")))
    }
}

impl BatchScheduler for FakeScheduler {
    fn submit<'a>(
        &'a mut self,
        header: &'a Path,
        depends_on: &'a [JobId],
    ) -> Pin<Box<dyn Future<Output = Result<JobId>> + Send + 'a>> {
        let result = self.record(header, depends_on);
        Box::pin(async move { result })
    }
}
