//! LLM-backed CV tailoring.
//!
//! Flow: build prompt from (CV, job) → LLM call with fixed-delay retry on
//! transient faults → validate payload → `OptimizedCv`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::llm_client::prompts::GROUNDING_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::{Cv, Job, OptimizedCv};
use crate::optimizer::prompts::{TAILOR_PROMPT_TEMPLATE, TAILOR_SYSTEM};
use crate::optimizer::{retry_with_fixed_delay, OptimizationError, Optimizer, RetryPolicy};

/// Shape of the JSON the model is asked to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoredCvPayload {
    #[serde(default)]
    pub tailored_summary: Option<String>,
    #[serde(default)]
    pub tailored_skills: Vec<String>,
    #[serde(default)]
    pub tailored_experience: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    pub full_text: String,
}

pub struct LlmOptimizer {
    llm: LlmClient,
    retry: RetryPolicy,
}

impl LlmOptimizer {
    pub fn new(llm: LlmClient, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }
}

#[async_trait]
impl Optimizer for LlmOptimizer {
    async fn optimize(&self, cv: &Arc<Cv>, job: &Job) -> Result<OptimizedCv, OptimizationError> {
        let prompt = build_tailor_prompt(cv, job);
        let prompt = prompt.as_str();

        let payload = retry_with_fixed_delay(self.retry, LlmError::is_transient, |attempt| {
            info!(
                "Optimizing CV | attempt={} | job={} | company={}",
                attempt, job.title, job.company
            );
            self.llm.call_json::<TailoredCvPayload>(prompt, TAILOR_SYSTEM)
        })
        .await
        .map_err(|e| {
            error!(
                "CV optimization failed after retries | job={} | company={} | error={e}",
                job.title, job.company
            );
            OptimizationError::Llm(e)
        })?;

        into_optimized_cv(payload, cv, job)
    }
}

fn into_optimized_cv(
    payload: TailoredCvPayload,
    cv: &Arc<Cv>,
    job: &Job,
) -> Result<OptimizedCv, OptimizationError> {
    if payload.full_text.trim().is_empty() {
        return Err(OptimizationError::InvalidOutput(
            "model returned an empty full_text".to_string(),
        ));
    }

    Ok(OptimizedCv {
        original_cv: Arc::clone(cv),
        job: job.clone(),
        tailored_summary: payload.tailored_summary,
        tailored_skills: payload.tailored_skills,
        tailored_experience: payload.tailored_experience,
        cover_letter: payload.cover_letter,
        full_text: Some(payload.full_text),
    })
}

/// Fills the tailoring template with the CV and job details.
fn build_tailor_prompt(cv: &Cv, job: &Job) -> String {
    let experience = cv
        .experience
        .iter()
        .map(|e| {
            format!(
                "- {} at {}: {}",
                e.role,
                e.company,
                e.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    TAILOR_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{job_title}", &job.title)
        .replace("{company}", &job.company)
        .replace("{required_skills}", &job.required_skills.join(", "))
        .replace(
            "{job_description}",
            job.description.as_deref().unwrap_or("(not provided)"),
        )
        .replace("{summary}", cv.summary.as_deref().unwrap_or("(not provided)"))
        .replace("{skills}", &cv.skills.join(", "))
        .replace("{experience}", &experience)
        .replace("{raw_text}", cv.raw_text.as_deref().unwrap_or("(not provided)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_text;
    use crate::models::cv::Experience;

    fn sample_cv() -> Arc<Cv> {
        Arc::new(Cv {
            full_name: "Jane Doe".into(),
            summary: Some("Backend developer".into()),
            skills: vec!["Rust".into(), "Postgres".into()],
            experience: vec![Experience {
                company: "Acme".into(),
                role: "Engineer".into(),
                start_date: None,
                end_date: None,
                description: Some("Built billing".into()),
            }],
            ..Default::default()
        })
    }

    #[test]
    fn test_prompt_contains_job_and_cv_details() {
        let mut job = Job::new("Platform Engineer", "Globex");
        job.description = Some("Own the deploy pipeline".into());
        job.required_skills = vec!["Kubernetes".into()];

        let prompt = build_tailor_prompt(&sample_cv(), &job);

        assert!(prompt.contains("Platform Engineer"));
        assert!(prompt.contains("Globex"));
        assert!(prompt.contains("Own the deploy pipeline"));
        assert!(prompt.contains("Kubernetes"));
        assert!(prompt.contains("Rust, Postgres"));
        assert!(prompt.contains("- Engineer at Acme: Built billing"));
        assert!(!prompt.contains("{job_title}"));
        assert!(!prompt.contains("{grounding_instruction}"));
    }

    #[test]
    fn test_payload_parses_from_fenced_json() {
        let text = "```json\n{\"tailored_skills\": [\"Rust\"], \"full_text\": \"CV\"}\n```";
        let payload: TailoredCvPayload = parse_json_text(text).unwrap();
        assert_eq!(payload.tailored_skills, vec!["Rust"]);
        assert!(payload.cover_letter.is_none());
    }

    #[test]
    fn test_empty_full_text_is_rejected() {
        let payload = TailoredCvPayload {
            tailored_summary: None,
            tailored_skills: vec![],
            tailored_experience: None,
            cover_letter: None,
            full_text: "   ".into(),
        };
        let result = into_optimized_cv(payload, &sample_cv(), &Job::new("A", "B"));
        assert!(matches!(result, Err(OptimizationError::InvalidOutput(_))));
    }

    #[test]
    fn test_payload_maps_onto_optimized_cv() {
        let payload = TailoredCvPayload {
            tailored_summary: Some("Tailored".into()),
            tailored_skills: vec!["Rust".into()],
            tailored_experience: None,
            cover_letter: Some("Dear Globex".into()),
            full_text: "Full CV".into(),
        };
        let job = Job::new("Platform Engineer", "Globex");
        let optimized = into_optimized_cv(payload, &sample_cv(), &job).unwrap();
        assert_eq!(optimized.job, job);
        assert_eq!(optimized.cover_letter.as_deref(), Some("Dear Globex"));
        assert_eq!(optimized.full_text.as_deref(), Some("Full CV"));
    }
}
