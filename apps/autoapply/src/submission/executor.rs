use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{FieldMapping, FieldValue, FormField, FormFieldType, FormSchema, Job};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Executor could not be opened: {0}")]
    Open(String),

    #[error("Unsupported apply URL '{0}'")]
    UnsupportedUrl(String),

    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error("Invalid form schema: {0}")]
    Schema(#[from] crate::models::form::SchemaError),

    #[error("Executor handle {0} is not open")]
    NotOpen(Uuid),
}

/// Opaque handle to an open executor session (a browser, an HTTP session, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorHandle {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
}

impl Default for ExecutorHandle {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
        }
    }
}

/// One field the executor could not fill. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillIssue {
    pub field_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    pub filled: Vec<String>,
    pub skipped: Vec<String>,
    pub issues: Vec<FillIssue>,
}

/// Drives an external application form. One instance per run.
///
/// The engine opens the session lazily, at most once per run, and never closes
/// it; teardown belongs to whoever owns the run.
#[async_trait]
pub trait FormExecutor: Send + Sync {
    /// Opens the session. Idempotent: returns the existing handle if already open.
    async fn open(&self, apply_url: &str) -> Result<ExecutorHandle, ExecutorError>;

    async fn extract_schema(
        &self,
        handle: &ExecutorHandle,
        job: &Job,
    ) -> Result<FormSchema, ExecutorError>;

    /// Applies the mapping to the live form. Per-field failures land in the report.
    async fn fill(
        &self,
        handle: &ExecutorHandle,
        schema: &FormSchema,
        mapping: &FieldMapping,
    ) -> FillReport;

    async fn close(&self, handle: ExecutorHandle) -> Result<(), ExecutorError>;
}

/// Checks every mapped value against its field type without touching a live form.
/// Shared by the executors that fill in dry-run mode.
pub async fn dry_fill(schema: &FormSchema, mapping: &FieldMapping) -> FillReport {
    let mut report = FillReport::default();

    for field in schema.fields() {
        let Some(Some(value)) = mapping.get(&field.field_id) else {
            debug!("Skipping unmapped field | id={}", field.field_id);
            report.skipped.push(field.field_id.clone());
            continue;
        };

        match check_value(field, value).await {
            Ok(()) => {
                info!("Filled field | id={} | type={:?}", field.field_id, field.field_type);
                report.filled.push(field.field_id.clone());
            }
            Err(reason) => {
                warn!("Could not fill field | id={} | reason={reason}", field.field_id);
                report.issues.push(FillIssue {
                    field_id: field.field_id.clone(),
                    reason,
                });
            }
        }
    }

    report
}

async fn check_value(field: &FormField, value: &FieldValue) -> Result<(), String> {
    match (field.field_type, value) {
        (FormFieldType::FileUpload, FieldValue::Text(path)) => {
            match tokio::fs::try_exists(Path::new(path)).await {
                Ok(true) => Ok(()),
                _ => Err(format!("file '{path}' does not exist")),
            }
        }
        (FormFieldType::FileUpload, FieldValue::List(_)) => {
            Err("file upload expects a single path".to_string())
        }
        (FormFieldType::Email, FieldValue::Text(email)) if !email.contains('@') => {
            Err(format!("'{email}' is not an email address"))
        }
        _ => Ok(()),
    }
}
