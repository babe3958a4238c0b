use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::models::{Cv, Job, OptimizedCv};
use crate::optimizer::{OptimizationError, Optimizer};

/// Deterministic optimizer with no LLM call. Copies the CV content unchanged.
///
/// Used for dry runs and whenever no API key is configured.
pub struct PassthroughOptimizer;

#[async_trait]
impl Optimizer for PassthroughOptimizer {
    async fn optimize(&self, cv: &Arc<Cv>, job: &Job) -> Result<OptimizedCv, OptimizationError> {
        info!(
            "Passthrough optimizer: reusing CV as-is for {} at {}",
            job.title, job.company
        );

        Ok(OptimizedCv {
            original_cv: Arc::clone(cv),
            job: job.clone(),
            tailored_summary: cv.summary.clone(),
            tailored_skills: cv.skills.clone(),
            tailored_experience: None,
            cover_letter: None,
            full_text: cv.raw_text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_copies_cv_content() {
        let cv = Arc::new(Cv {
            full_name: "Jane Doe".into(),
            summary: Some("Backend developer".into()),
            skills: vec!["Rust".into(), "SQL".into()],
            raw_text: Some("CV text".into()),
            ..Default::default()
        });
        let job = Job::new("Backend Engineer", "Acme");

        let optimized = PassthroughOptimizer.optimize(&cv, &job).await.unwrap();

        assert!(Arc::ptr_eq(&optimized.original_cv, &cv));
        assert_eq!(optimized.job, job);
        assert_eq!(optimized.tailored_summary.as_deref(), Some("Backend developer"));
        assert_eq!(optimized.tailored_skills, vec!["Rust", "SQL"]);
        assert_eq!(optimized.full_text.as_deref(), Some("CV text"));
    }
}
