use std::sync::Arc;

use crate::errors::FailureReason;
use crate::models::{Cv, FieldMapping, FormSchema, Job, JobQueue, OptimizedCv, UserProfile};
use crate::submission::{AtsType, CompiledSchema, ExecutorHandle, MappingSources};

/// Everything the engine knows about the run in progress.
///
/// One instance per run, owned by the caller and lent to the engine loop.
/// Per-job fields are reset on `POP_JOB` and when an outcome is recorded.
#[derive(Debug)]
pub struct RunState {
    pub cv: Arc<Cv>,
    pub profile: Option<UserProfile>,
    pub queue: JobQueue,

    pub current_job: Option<Job>,
    pub current_optimized_cv: Option<OptimizedCv>,
    pub retry_count: u32,
    pub submission_attempts: u32,
    pub ats_type: Option<AtsType>,
    pub form_schema: Option<FormSchema>,
    /// `form_schema` bound to its accessors; reused by every remap of the form.
    pub compiled_schema: Option<CompiledSchema>,
    pub field_mapping: Option<FieldMapping>,
    pub last_failure: Option<FailureReason>,

    /// Opened lazily on the first submission; lives for the rest of the run.
    pub executor_handle: Option<ExecutorHandle>,
}

impl RunState {
    pub fn new(cv: Arc<Cv>, profile: Option<UserProfile>, queue: JobQueue) -> Self {
        Self {
            cv,
            profile,
            queue,
            current_job: None,
            current_optimized_cv: None,
            retry_count: 0,
            submission_attempts: 0,
            ats_type: None,
            form_schema: None,
            compiled_schema: None,
            field_mapping: None,
            last_failure: None,
            executor_handle: None,
        }
    }

    /// Starts work on `job`, discarding every per-job leftover.
    pub(crate) fn begin_job(&mut self, job: Job) {
        self.clear_job();
        self.current_job = Some(job);
        self.submission_attempts = 0;
    }

    /// Drops the current job and everything derived from it. The executor
    /// handle and counters that span the run are untouched.
    pub(crate) fn clear_job(&mut self) {
        self.current_job = None;
        self.current_optimized_cv = None;
        self.ats_type = None;
        self.form_schema = None;
        self.compiled_schema = None;
        self.field_mapping = None;
        self.last_failure = None;
    }

    pub fn mapping_sources(&self) -> MappingSources<'_> {
        MappingSources {
            cv: Some(self.cv.as_ref()),
            optimized_cv: self.current_optimized_cv.as_ref(),
            profile: self.profile.as_ref(),
        }
    }

    pub fn take_executor_handle(&mut self) -> Option<ExecutorHandle> {
        self.executor_handle.take()
    }
}
