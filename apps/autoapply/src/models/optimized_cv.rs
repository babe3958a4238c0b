use std::sync::Arc;

use crate::models::cv::Cv;
use crate::models::job::Job;

/// CV content tailored to one job. Produced once per successfully optimized job
/// and dropped after the job's outcome is recorded.
#[derive(Debug, Clone)]
pub struct OptimizedCv {
    pub original_cv: Arc<Cv>,
    pub job: Job,
    pub tailored_summary: Option<String>,
    pub tailored_skills: Vec<String>,
    pub tailored_experience: Option<String>,
    pub cover_letter: Option<String>,
    /// Final rendered CV text used for submission.
    pub full_text: Option<String>,
}
