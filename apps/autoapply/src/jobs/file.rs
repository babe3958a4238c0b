use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::jobs::JobSource;
use crate::models::{Cv, Job, JobQueue};

/// Reads postings from a JSON array on disk.
pub struct FileJobSource {
    path: PathBuf,
}

impl FileJobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobSource for FileJobSource {
    /// Keeps the postings that mention the query. When none do, every posting is kept.
    async fn find_matching_jobs(&self, query: &str, _cv: &Cv) -> Result<JobQueue> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read jobs file '{}'", self.path.display()))?;
        let jobs: Vec<Job> = serde_json::from_str(&content)
            .with_context(|| format!("Jobs file '{}' is not a JSON array of jobs", self.path.display()))?;

        let needle = query.trim().to_lowercase();
        let matching: Vec<Job> = jobs
            .iter()
            .filter(|job| mentions(job, &needle))
            .cloned()
            .collect();

        let selected = if matching.is_empty() {
            warn!(
                "No job in '{}' mentions '{}', keeping all {}",
                self.path.display(),
                query,
                jobs.len()
            );
            jobs
        } else {
            matching
        };

        info!("Loaded {} jobs from {}", selected.len(), self.path.display());
        Ok(JobQueue::new(selected))
    }
}

fn mentions(job: &Job, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    job.title.to_lowercase().contains(needle)
        || job
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
        || job
            .required_skills
            .iter()
            .any(|s| s.to_lowercase().contains(needle))
}
