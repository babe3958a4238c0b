use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A job posting. Immutable once produced by a job source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Platform-specific job id.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "application_url")]
    pub apply_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[cfg(test)]
impl Job {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_apply_url(mut self, url: impl Into<String>) -> Self {
        self.apply_url = Some(url.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Job {
    /// The apply URL, if present and not blank.
    pub fn apply_url(&self) -> Option<&str> {
        self.apply_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Cannot pop from an empty job queue")]
    Empty,
}

/// FIFO worklist of jobs. Owns iteration order for the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            jobs: jobs.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn pop_next(&mut self) -> Result<Job, QueueError> {
        self.jobs.pop_front().ok_or(QueueError::Empty)
    }

    #[cfg(test)]
    pub fn add(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }
}
