//! Where job postings come from, and how the search query is chosen.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Cv, JobQueue};

pub mod file;
pub mod mock;

pub use file::FileJobSource;
pub use mock::MockJobSource;

const DEFAULT_QUERY: &str = "Software Engineer";

#[async_trait]
pub trait JobSource: Send + Sync {
    async fn find_matching_jobs(&self, query: &str, cv: &Cv) -> Result<JobQueue>;
}

/// Picks the job query for a run.
///
/// An explicit, non-blank query wins; otherwise the most recent role on the CV,
/// then "<first skill> Developer", then a generic default.
pub fn resolve_job_query(user_query: Option<&str>, cv: &Cv) -> String {
    if let Some(query) = user_query.map(str::trim).filter(|q| !q.is_empty()) {
        return query.to_string();
    }

    if let Some(role) = cv
        .experience
        .first()
        .map(|e| e.role.trim())
        .filter(|r| !r.is_empty())
    {
        return role.to_string();
    }

    if let Some(skill) = cv.skills.first().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return format!("{skill} Developer");
    }

    DEFAULT_QUERY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::Experience;

    fn cv_with(role: Option<&str>, skills: &[&str]) -> Cv {
        Cv {
            full_name: "Jane Doe".into(),
            experience: role
                .map(|r| {
                    vec![Experience {
                        company: "Acme".into(),
                        role: r.into(),
                        start_date: None,
                        end_date: None,
                        description: None,
                    }]
                })
                .unwrap_or_default(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_query_wins() {
        let cv = cv_with(Some("Data Engineer"), &["Rust"]);
        assert_eq!(resolve_job_query(Some("  Platform Engineer "), &cv), "Platform Engineer");
    }

    #[test]
    fn test_blank_query_falls_back_to_recent_role() {
        let cv = cv_with(Some("Data Engineer"), &["Rust"]);
        assert_eq!(resolve_job_query(Some("   "), &cv), "Data Engineer");
    }

    #[test]
    fn test_skill_fallback() {
        let cv = cv_with(None, &["Rust", "Go"]);
        assert_eq!(resolve_job_query(None, &cv), "Rust Developer");
    }

    #[test]
    fn test_default_query() {
        assert_eq!(resolve_job_query(None, &cv_with(None, &[])), DEFAULT_QUERY);
    }
}
