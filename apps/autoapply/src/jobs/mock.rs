use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::jobs::JobSource;
use crate::models::{Cv, Job, JobQueue};

/// Deterministic two-job source. The query only labels the postings.
pub struct MockJobSource;

#[async_trait]
impl JobSource for MockJobSource {
    async fn find_matching_jobs(&self, query: &str, cv: &Cv) -> Result<JobQueue> {
        let location = cv.location.clone().unwrap_or_else(|| "Remote".to_string());
        let skills: Vec<String> = cv.skills.iter().take(3).cloned().collect();

        let posting = |id: &str, company: &str, description: String, url: &str| Job {
            id: Some(id.to_string()),
            title: query.to_string(),
            company: company.to_string(),
            location: Some(location.clone()),
            required_skills: skills.clone(),
            description: Some(description),
            apply_url: Some(url.to_string()),
            source: Some("mock".to_string()),
            ..Default::default()
        };

        let jobs = vec![
            posting(
                "mock-1",
                "ExampleCorp",
                format!("Looking for a {query} with relevant experience."),
                "https://boards.greenhouse.io/examplecorp/jobs/1",
            ),
            posting(
                "mock-2",
                "AnotherTech",
                format!("Hiring a skilled {query} to join our team."),
                "https://boards.greenhouse.io/anothertech/jobs/2",
            ),
        ];

        info!("Mock job source returned {} jobs for '{}'", jobs.len(), query);
        Ok(JobQueue::new(jobs))
    }
}
