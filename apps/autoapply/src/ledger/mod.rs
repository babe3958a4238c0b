//! Run ledger: an append-only record of per-job outcomes plus a terminal summary.
//!
//! Persisted as `{run_id, candidate, started_at, jobs[], summary}`. Every job the
//! engine processes yields exactly one entry with status `submitted` or `failed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::FailureReason;
use crate::models::{Job, JobQueue};

pub mod memory;
pub mod store;

pub use memory::MemorySink;
pub use store::ResultStore;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not move ledger into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Ledger writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Submitted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub company: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// Rebuilds enough of the job to queue it again.
    pub fn to_job(&self) -> Job {
        Job {
            id: self.job_id.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            apply_url: self.apply_url.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_jobs: usize,
    pub submitted: usize,
    pub failed: usize,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLedger {
    pub run_id: String,
    pub candidate: String,
    pub started_at: DateTime<Utc>,
    pub jobs: Vec<LedgerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl RunLedger {
    pub fn new(candidate: impl Into<String>) -> Self {
        let started_at = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            run_id: format!("run_{}_{}", started_at.format("%Y-%m-%d_%H-%M-%S"), &suffix[..8]),
            candidate: candidate.into(),
            started_at,
            jobs: Vec::new(),
            summary: None,
        }
    }

    pub fn record_success(&mut self, job: &Job) {
        self.jobs.push(entry(job, EntryStatus::Submitted, None));
    }

    pub fn record_failure(&mut self, job: &Job, reason: &FailureReason) {
        self.jobs.push(entry(job, EntryStatus::Failed, Some(reason)));
    }

    /// Recomputes the summary from the entries recorded so far.
    pub fn finalize(&mut self) -> &RunSummary {
        let submitted = self.count(EntryStatus::Submitted);
        let failed = self.count(EntryStatus::Failed);
        self.summary.insert(RunSummary {
            total_jobs: self.jobs.len(),
            submitted,
            failed,
            completed_at: Utc::now(),
        })
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }

    /// Failed entries as a fresh queue, in ledger order.
    pub fn failed_jobs(&self) -> JobQueue {
        JobQueue::new(
            self.jobs
                .iter()
                .filter(|j| j.status == EntryStatus::Failed)
                .map(LedgerEntry::to_job),
        )
    }
}

fn entry(job: &Job, status: EntryStatus, reason: Option<&FailureReason>) -> LedgerEntry {
    LedgerEntry {
        company: job.company.clone(),
        title: job.title.clone(),
        job_id: job.id.clone(),
        apply_url: job.apply_url.clone(),
        status,
        error: reason.map(ToString::to_string),
        error_type: reason.map(|r| r.kind().to_string()),
        timestamp: Utc::now(),
    }
}

/// Where the engine reports per-job outcomes.
#[async_trait]
pub trait RunSink: Send {
    fn record_success(&mut self, job: &Job);

    fn record_failure(&mut self, job: &Job, reason: &FailureReason);

    /// Computes the summary and persists the ledger. Safe to call repeatedly.
    async fn save(&mut self) -> Result<(), LedgerError>;

    fn ledger(&self) -> &RunLedger;
}
