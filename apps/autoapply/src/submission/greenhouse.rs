//! Greenhouse executor: reads application forms from the public job-board API.
//!
//! `GET {api_base}/{board}/jobs/{job_id}?questions=true` returns the job with its
//! application questions; each question becomes one `FormField`. Filling is a
//! dry run: values are checked against their field types but nothing is posted.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::form::SchemaError;
use crate::models::{FieldMapping, FormField, FormFieldType, FormSchema, Job};
use crate::submission::ats::AtsType;
use crate::submission::executor::{
    dry_fill, ExecutorError, ExecutorHandle, FillReport, FormExecutor,
};

pub const DEFAULT_API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    #[serde(default)]
    absolute_url: Option<String>,
    #[serde(default)]
    questions: Vec<GreenhouseQuestion>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseQuestion {
    label: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    fields: Vec<GreenhouseField>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

pub struct GreenhouseExecutor {
    client: Client,
    api_base: String,
    session: Mutex<Option<ExecutorHandle>>,
}

impl GreenhouseExecutor {
    pub fn new(api_base: impl Into<String>) -> Result<Self, ExecutorError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            session: Mutex::new(None),
        })
    }

    fn current_session(&self) -> Result<Option<ExecutorHandle>, ExecutorError> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|_| ExecutorError::Open("session lock poisoned".to_string()))
    }
}

#[async_trait]
impl FormExecutor for GreenhouseExecutor {
    async fn open(&self, apply_url: &str) -> Result<ExecutorHandle, ExecutorError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ExecutorError::Open("session lock poisoned".to_string()))?;

        if let Some(handle) = session.as_ref() {
            debug!("Reusing Greenhouse session {}", handle.id);
            return Ok(handle.clone());
        }

        let handle = ExecutorHandle::default();
        info!(
            "Opened Greenhouse session {} (first job: {apply_url})",
            handle.id
        );
        *session = Some(handle.clone());
        Ok(handle)
    }

    async fn extract_schema(
        &self,
        handle: &ExecutorHandle,
        job: &Job,
    ) -> Result<FormSchema, ExecutorError> {
        if self.current_session()?.as_ref() != Some(handle) {
            return Err(ExecutorError::NotOpen(handle.id));
        }

        let apply_url = job.apply_url().unwrap_or_default();
        let (board, job_id) = parse_job_url(apply_url)
            .ok_or_else(|| ExecutorError::UnsupportedUrl(apply_url.to_string()))?;

        let endpoint = format!("{}/{board}/jobs/{job_id}?questions=true", self.api_base);
        info!("Fetching Greenhouse application form | board={board} | job={job_id}");

        let response = self.client.get(&endpoint).send().await?;
        if !response.status().is_success() {
            return Err(ExecutorError::FormNotFound(format!(
                "{endpoint} returned {}",
                response.status()
            )));
        }

        let posting: GreenhouseJob = response.json().await?;
        let form_url = posting
            .absolute_url
            .unwrap_or_else(|| apply_url.to_string());
        let schema = schema_from_questions(posting.questions, form_url)?;

        info!("Extracted {} Greenhouse fields", schema.fields().len());
        Ok(schema)
    }

    async fn fill(
        &self,
        handle: &ExecutorHandle,
        schema: &FormSchema,
        mapping: &FieldMapping,
    ) -> FillReport {
        debug!("Dry-run fill on session {}", handle.id);
        dry_fill(schema, mapping).await
    }

    async fn close(&self, handle: ExecutorHandle) -> Result<(), ExecutorError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ExecutorError::Open("session lock poisoned".to_string()))?;

        match session.take() {
            Some(open) if open == handle => {
                info!("Closed Greenhouse session {}", handle.id);
                Ok(())
            }
            other => {
                *session = other;
                Err(ExecutorError::NotOpen(handle.id))
            }
        }
    }
}

/// Extracts `(board, job_id)` from a Greenhouse apply URL.
///
/// Accepts `/{board}/jobs/{id}` paths and the embed form
/// `/embed/job_app?for={board}&token={id}`.
pub fn parse_job_url(apply_url: &str) -> Option<(String, String)> {
    let url = Url::parse(apply_url.trim()).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    if let [board, "jobs", job_id, ..] = segments.as_slice() {
        return Some((board.to_string(), job_id.to_string()));
    }

    if segments.as_slice() == ["embed", "job_app"] {
        let mut board = None;
        let mut token = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "for" => board = Some(value.into_owned()),
                "token" => token = Some(value.into_owned()),
                _ => {}
            }
        }
        return board.zip(token);
    }

    None
}

fn schema_from_questions(
    questions: Vec<GreenhouseQuestion>,
    form_url: String,
) -> Result<FormSchema, SchemaError> {
    let mut fields: Vec<FormField> = Vec::with_capacity(questions.len());

    for question in questions {
        // Alternate inputs (e.g. resume_text next to resume) share one question; the first is primary.
        let Some(primary) = question.fields.into_iter().next() else {
            continue;
        };
        if primary.field_type == "input_hidden" {
            continue;
        }
        if fields.iter().any(|f| f.field_id == primary.name) {
            warn!("Skipping repeated Greenhouse field '{}'", primary.name);
            continue;
        }

        let label = question.label.trim().trim_end_matches('*').trim().to_string();
        let field_type = field_type_for(&primary);
        fields.push(FormField::new(primary.name, label, field_type, question.required));
    }

    FormSchema::new(AtsType::Greenhouse.as_str(), form_url, fields)
}

fn field_type_for(field: &GreenhouseField) -> FormFieldType {
    let name = field.name.to_lowercase();
    match field.field_type.as_str() {
        "input_file" => FormFieldType::FileUpload,
        "textarea" => FormFieldType::Textarea,
        "multi_value_single_select" => FormFieldType::Select,
        "multi_value_multi_select" => FormFieldType::Multiselect,
        _ if name.contains("email") => FormFieldType::Email,
        _ if name.contains("phone") => FormFieldType::Phone,
        _ => FormFieldType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_board_url() {
        assert_eq!(
            parse_job_url("https://job-boards.greenhouse.io/rhino/jobs/4079601009"),
            Some(("rhino".to_string(), "4079601009".to_string()))
        );
    }

    #[test]
    fn test_parse_embed_url() {
        assert_eq!(
            parse_job_url("https://boards.greenhouse.io/embed/job_app?for=acme&token=42"),
            Some(("acme".to_string(), "42".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_board_root() {
        assert_eq!(parse_job_url("https://boards.greenhouse.io/acme"), None);
        assert_eq!(parse_job_url("not a url"), None);
    }

    #[test]
    fn test_questions_become_schema_fields() {
        let posting: GreenhouseJob = serde_json::from_value(serde_json::json!({
            "absolute_url": "https://boards.greenhouse.io/acme/jobs/1",
            "questions": [
                {"label": "First Name", "required": true,
                 "fields": [{"name": "first_name", "type": "input_text"}]},
                {"label": "Email*", "required": true,
                 "fields": [{"name": "email", "type": "input_text"}]},
                {"label": "Phone", "required": false,
                 "fields": [{"name": "phone", "type": "input_text"}]},
                {"label": "Resume/CV", "required": true,
                 "fields": [{"name": "resume", "type": "input_file"},
                            {"name": "resume_text", "type": "textarea"}]},
                {"label": "Cover Letter", "required": false,
                 "fields": [{"name": "cover_letter", "type": "textarea"}]},
                {"label": "Tracking", "required": false,
                 "fields": [{"name": "gh_src", "type": "input_hidden"}]},
                {"label": "Empty", "required": false, "fields": []}
            ]
        }))
        .unwrap();

        let schema = schema_from_questions(
            posting.questions,
            posting.absolute_url.unwrap(),
        )
        .unwrap();

        let ids: Vec<_> = schema.fields().iter().map(|f| f.field_id.as_str()).collect();
        assert_eq!(ids, vec!["first_name", "email", "phone", "resume", "cover_letter"]);
        assert_eq!(schema.ats_type, "greenhouse");

        let email = schema.field("email").unwrap();
        assert_eq!(email.label, "Email");
        assert_eq!(email.field_type, FormFieldType::Email);
        assert!(email.required);

        assert_eq!(schema.field("phone").unwrap().field_type, FormFieldType::Phone);
        assert_eq!(
            schema.field("resume").unwrap().field_type,
            FormFieldType::FileUpload
        );
        assert_eq!(
            schema.field("cover_letter").unwrap().field_type,
            FormFieldType::Textarea
        );
    }

    #[tokio::test]
    async fn test_open_is_idempotent_and_close_releases() {
        let executor = GreenhouseExecutor::new(DEFAULT_API_BASE).unwrap();

        let first = executor.open("https://boards.greenhouse.io/a/jobs/1").await.unwrap();
        let second = executor.open("https://boards.greenhouse.io/b/jobs/2").await.unwrap();
        assert_eq!(first, second);

        executor.close(first.clone()).await.unwrap();
        assert!(matches!(
            executor.close(first).await,
            Err(ExecutorError::NotOpen(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_schema_requires_open_session() {
        let executor = GreenhouseExecutor::new(DEFAULT_API_BASE).unwrap();
        let job = Job::new("Engineer", "Acme").with_apply_url("https://boards.greenhouse.io/a/jobs/1");

        let result = executor
            .extract_schema(&ExecutorHandle::default(), &job)
            .await;
        assert!(matches!(result, Err(ExecutorError::NotOpen(_))));
    }
}
