use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::models::{FieldMapping, FormField, FormFieldType, FormSchema, Job};
use crate::submission::ats::detect_ats;
use crate::submission::executor::{
    dry_fill, ExecutorError, ExecutorHandle, FillReport, FormExecutor,
};

/// Network-free executor that serves a fixed application form for every job.
pub struct DryRunExecutor {
    fields: Vec<FormField>,
    session: Mutex<Option<ExecutorHandle>>,
}

impl DryRunExecutor {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            session: Mutex::new(None),
        }
    }
}

impl Default for DryRunExecutor {
    /// The basic form most ATSes present: name, contact, resume, cover letter.
    fn default() -> Self {
        Self::new(vec![
            FormField::new("first_name", "First Name", FormFieldType::Text, true)
                .with_hint("user_profile.first_name"),
            FormField::new("last_name", "Last Name", FormFieldType::Text, true)
                .with_hint("user_profile.last_name"),
            FormField::new("email", "Email", FormFieldType::Email, true),
            FormField::new("phone", "Phone", FormFieldType::Phone, false),
            FormField::new("resume", "Resume/CV", FormFieldType::FileUpload, true)
                .with_hint("cv.resume_path"),
            FormField::new("cover_letter", "Cover Letter", FormFieldType::Textarea, false)
                .with_hint("optimized_cv.cover_letter"),
        ])
    }
}

#[async_trait]
impl FormExecutor for DryRunExecutor {
    async fn open(&self, apply_url: &str) -> Result<ExecutorHandle, ExecutorError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ExecutorError::Open("session lock poisoned".to_string()))?;

        let handle = session.get_or_insert_with(|| {
            info!("Opened dry-run session (first job: {apply_url})");
            ExecutorHandle::default()
        });
        Ok(handle.clone())
    }

    async fn extract_schema(
        &self,
        handle: &ExecutorHandle,
        job: &Job,
    ) -> Result<FormSchema, ExecutorError> {
        info!(
            "Extracting dry-run form | session={} | title={} | company={}",
            handle.id, job.title, job.company
        );
        let form_url = job.apply_url().unwrap_or_default();
        let ats = detect_ats(form_url)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(FormSchema::new(ats, form_url, self.fields.clone())?)
    }

    async fn fill(
        &self,
        _handle: &ExecutorHandle,
        schema: &FormSchema,
        mapping: &FieldMapping,
    ) -> FillReport {
        dry_fill(schema, mapping).await
    }

    async fn close(&self, handle: ExecutorHandle) -> Result<(), ExecutorError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| ExecutorError::Open("session lock poisoned".to_string()))?;
        match session.take() {
            Some(open) if open == handle => {
                info!("Closed dry-run session {}", handle.id);
                Ok(())
            }
            other => {
                *session = other;
                Err(ExecutorError::NotOpen(handle.id))
            }
        }
    }
}
