use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::engine::stage::Stage;
use crate::engine::state::RunState;
use crate::errors::FailureReason;
use crate::ledger::{LedgerError, RunSink};
use crate::optimizer::Optimizer;
use crate::submission::validator::ValidationReport;
use crate::submission::{
    detect_ats, validate_mapping, CompiledSchema, ExecutorError, FormExecutor,
};

/// Errors that abort the whole run. Per-job failures never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Form executor could not be opened: {0}")]
    ExecutorUnavailable(#[source] ExecutorError),

    #[error("Run ledger could not be saved: {0}")]
    Ledger(#[from] LedgerError),
}

/// Run-level retry budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Consecutive optimizer failures tolerated per job.
    pub max_retries: u32,
    /// Map/fill/validate cycles per job, and the confirmation budget.
    pub max_submission_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_submission_attempts: 2,
        }
    }
}

/// The path a run took, stage by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub transitions: usize,
    pub visits: BTreeMap<Stage, usize>,
}

impl RunReport {
    fn enter(&mut self, stage: Stage) {
        *self.visits.entry(stage).or_default() += 1;
    }

    #[cfg(test)]
    pub fn visits(&self, stage: Stage) -> usize {
        self.visits.get(&stage).copied().unwrap_or(0)
    }
}

pub struct Engine {
    optimizer: Arc<dyn Optimizer>,
    executor: Arc<dyn FormExecutor>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        optimizer: Arc<dyn Optimizer>,
        executor: Arc<dyn FormExecutor>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            optimizer,
            executor,
            settings,
        }
    }

    /// Drives the run from `POP_JOB` until the queue is exhausted, then saves the ledger.
    ///
    /// The executor handle, if one was opened, is left in `state` for the caller to close.
    pub async fn run(
        &self,
        state: &mut RunState,
        sink: &mut dyn RunSink,
    ) -> Result<RunReport, EngineError> {
        info!(
            "Run started | jobs={} | max_retries={} | max_submission_attempts={}",
            state.queue.len(),
            self.settings.max_retries,
            self.settings.max_submission_attempts
        );

        let mut report = RunReport::default();
        let mut stage = Stage::PopJob;
        report.enter(stage);

        while stage != Stage::End {
            let next = self.step(stage, state, sink).await?;
            debug!("stage transition | from={} | to={}", stage, next);
            report.transitions += 1;
            report.enter(next);
            stage = next;
        }

        sink.save().await?;

        let ledger = sink.ledger();
        info!(
            "Run finished | run_id={} | submitted={} | failed={} | transitions={}",
            ledger.run_id,
            ledger.summary.as_ref().map(|s| s.submitted).unwrap_or(0),
            ledger.summary.as_ref().map(|s| s.failed).unwrap_or(0),
            report.transitions
        );
        Ok(report)
    }

    /// Executes one stage and returns the next.
    pub async fn step(
        &self,
        stage: Stage,
        state: &mut RunState,
        sink: &mut dyn RunSink,
    ) -> Result<Stage, EngineError> {
        let next = match stage {
            Stage::PopJob => self.pop_job(state),
            Stage::Optimize => self.optimize(state).await,
            Stage::OptFailed => self.opt_failed(state, sink),
            Stage::SubmitStart => self.submit_start(state).await?,
            Stage::DetectAts => self.detect_ats(state),
            Stage::ExtractSchema => self.extract_schema(state).await,
            Stage::MapFields => self.map_fields(state),
            Stage::FillForm => self.fill_form(state).await,
            Stage::ValidateForm => self.validate_form(state),
            Stage::ConfirmSubmit => self.confirm_submit(state),
            Stage::SubmitSuccess => self.submit_success(state, sink),
            Stage::SubmitFailed => self.submit_failed(state, sink),
            Stage::End => Stage::End,
        };
        Ok(next)
    }

    // ── Job intake ─────────────────────────────────────────────────────────────

    fn pop_job(&self, state: &mut RunState) -> Stage {
        match state.queue.pop_next() {
            Ok(job) => {
                info!(
                    "Processing job | title={} | company={} | remaining={}",
                    job.title,
                    job.company,
                    state.queue.len()
                );
                state.begin_job(job);
                Stage::Optimize
            }
            Err(_) => {
                info!("Job queue exhausted");
                Stage::End
            }
        }
    }

    // ── Optimization ───────────────────────────────────────────────────────────

    async fn optimize(&self, state: &mut RunState) -> Stage {
        let Some(job) = state.current_job.as_ref() else {
            warn!("OPTIMIZE reached without a current job, skipping");
            return Stage::PopJob;
        };

        info!(
            "Optimizing CV | job={} | attempt={}/{}",
            job.title,
            state.retry_count + 1,
            self.settings.max_retries
        );

        match self.optimizer.optimize(&state.cv, job).await {
            Ok(optimized) => {
                state.current_optimized_cv = Some(optimized);
                state.retry_count = 0;
                Stage::SubmitStart
            }
            Err(e) => {
                state.retry_count += 1;
                warn!(
                    "Optimization failed | job={} | attempt={}/{} | error={}",
                    job.title, state.retry_count, self.settings.max_retries, e
                );
                if state.retry_count < self.settings.max_retries {
                    Stage::Optimize
                } else {
                    Stage::OptFailed
                }
            }
        }
    }

    fn opt_failed(&self, state: &mut RunState, sink: &mut dyn RunSink) -> Stage {
        if let Some(job) = state.current_job.as_ref() {
            let reason = FailureReason::OptimizationExhausted {
                attempts: state.retry_count,
            };
            error!("Job failed | title={} | company={} | reason={}", job.title, job.company, reason);
            sink.record_failure(job, &reason);
        }
        state.clear_job();
        state.retry_count = 0;
        Stage::PopJob
    }

    // ── Submission ─────────────────────────────────────────────────────────────

    async fn submit_start(&self, state: &mut RunState) -> Result<Stage, EngineError> {
        let Some(job) = state.current_job.as_ref() else {
            warn!("SUBMIT_START reached without a current job, skipping");
            return Ok(Stage::PopJob);
        };
        let apply_url = job.apply_url().map(str::to_owned);

        if state.current_optimized_cv.is_none() {
            return Ok(fail(state, FailureReason::MissingPrerequisite(
                "no optimized CV for submission".to_string(),
            )));
        }
        let Some(apply_url) = apply_url else {
            return Ok(fail(state, FailureReason::MissingPrerequisite(
                "job has no apply URL".to_string(),
            )));
        };

        if state.executor_handle.is_none() {
            let handle = self
                .executor
                .open(&apply_url)
                .await
                .map_err(EngineError::ExecutorUnavailable)?;
            info!("Form executor opened | session={}", handle.id);
            state.executor_handle = Some(handle);
        }

        Ok(Stage::DetectAts)
    }

    fn detect_ats(&self, state: &mut RunState) -> Stage {
        let Some(apply_url) = state.current_job.as_ref().and_then(|j| j.apply_url()) else {
            return fail(state, FailureReason::MissingPrerequisite(
                "job has no apply URL".to_string(),
            ));
        };

        match detect_ats(apply_url) {
            Some(ats) => {
                info!("Detected ATS | ats={} | url={}", ats, apply_url);
                state.ats_type = Some(ats);
                Stage::ExtractSchema
            }
            None => {
                let reason = FailureReason::UnsupportedAts(apply_url.to_string());
                fail(state, reason)
            }
        }
    }

    async fn extract_schema(&self, state: &mut RunState) -> Stage {
        let (Some(handle), Some(job)) = (state.executor_handle.as_ref(), state.current_job.as_ref())
        else {
            return fail(state, FailureReason::MissingPrerequisite(
                "schema extraction needs an open executor and a job".to_string(),
            ));
        };

        match self.executor.extract_schema(handle, job).await {
            Ok(schema) => {
                info!(
                    "Extracted form schema | ats={} | fields={}",
                    schema.ats_type,
                    schema.fields().len()
                );
                state.compiled_schema = Some(CompiledSchema::compile(&schema));
                state.form_schema = Some(schema);
                Stage::MapFields
            }
            Err(e) => fail(state, FailureReason::SchemaExtraction(e.to_string())),
        }
    }

    fn map_fields(&self, state: &mut RunState) -> Stage {
        let Some(compiled) = state.compiled_schema.as_ref() else {
            return fail(state, FailureReason::MissingPrerequisite(
                "no form schema to map".to_string(),
            ));
        };

        let mapping = compiled.apply(&state.mapping_sources());
        let resolved = mapping.values().filter(|v| v.is_some()).count();
        info!(
            "Mapped fields | resolved={}/{} | attempt={}",
            resolved,
            compiled.len(),
            state.submission_attempts + 1
        );
        state.field_mapping = Some(mapping);
        Stage::FillForm
    }

    async fn fill_form(&self, state: &mut RunState) -> Stage {
        let (Some(handle), Some(schema), Some(mapping)) = (
            state.executor_handle.as_ref(),
            state.form_schema.as_ref(),
            state.field_mapping.as_ref(),
        ) else {
            warn!("FILL_FORM reached without schema or mapping, skipping fill");
            return Stage::ValidateForm;
        };

        let report = self.executor.fill(handle, schema, mapping).await;
        for issue in &report.issues {
            warn!("Field fill failed | id={} | reason={}", issue.field_id, issue.reason);
        }
        info!(
            "Filled form | filled={} | skipped={} | issues={}",
            report.filled.len(),
            report.skipped.len(),
            report.issues.len()
        );
        Stage::ValidateForm
    }

    fn validate_form(&self, state: &mut RunState) -> Stage {
        let report = match (state.form_schema.as_ref(), state.field_mapping.as_ref()) {
            (Some(schema), Some(mapping)) => validate_mapping(schema, mapping),
            _ => ValidationReport {
                missing_fields: vec!["<form>".to_string()],
            },
        };

        if report.is_valid() {
            return Stage::ConfirmSubmit;
        }
        let missing = report.missing_fields;

        state.submission_attempts += 1;
        warn!(
            "Validation failed | attempt={}/{} | missing={:?}",
            state.submission_attempts, self.settings.max_submission_attempts, missing
        );

        if state.submission_attempts < self.settings.max_submission_attempts {
            Stage::MapFields
        } else {
            let reason = FailureReason::ValidationFailed {
                missing,
                attempts: state.submission_attempts,
            };
            fail(state, reason)
        }
    }

    fn confirm_submit(&self, state: &mut RunState) -> Stage {
        state.submission_attempts += 1;
        if state.submission_attempts <= self.settings.max_submission_attempts {
            info!("Submission confirmed | attempt={}", state.submission_attempts);
            Stage::SubmitSuccess
        } else {
            let reason = FailureReason::ConfirmationExhausted {
                max_attempts: self.settings.max_submission_attempts,
            };
            fail(state, reason)
        }
    }

    // ── Outcomes ───────────────────────────────────────────────────────────────

    fn submit_success(&self, state: &mut RunState, sink: &mut dyn RunSink) -> Stage {
        if let Some(job) = state.current_job.as_ref() {
            info!("Application submitted | title={} | company={}", job.title, job.company);
            sink.record_success(job);
        }
        state.clear_job();
        Stage::PopJob
    }

    fn submit_failed(&self, state: &mut RunState, sink: &mut dyn RunSink) -> Stage {
        if let Some(job) = state.current_job.as_ref() {
            let reason = state.last_failure.clone().unwrap_or_else(|| {
                FailureReason::MissingPrerequisite("no failure reason recorded".to_string())
            });
            error!(
                "Submission failed | title={} | company={} | reason={}",
                job.title, job.company, reason
            );
            sink.record_failure(job, &reason);
        }
        state.clear_job();
        Stage::PopJob
    }
}

/// Remembers why the job failed and routes it to `SUBMIT_FAILED`.
fn fail(state: &mut RunState, reason: FailureReason) -> Stage {
    warn!("Job routed to SUBMIT_FAILED | kind={} | reason={}", reason.kind(), reason);
    state.last_failure = Some(reason);
    Stage::SubmitFailed
}
