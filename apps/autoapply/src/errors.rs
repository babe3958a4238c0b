use thiserror::Error;

use crate::engine::EngineError;
use crate::submission::ExecutorError;

/// Why a single job ended in failure. Recorded in the run ledger; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("optimization exhausted retries ({attempts} attempts)")]
    OptimizationExhausted { attempts: u32 },

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("unsupported ATS for apply URL '{0}'")]
    UnsupportedAts(String),

    #[error("form schema extraction failed: {0}")]
    SchemaExtraction(String),

    #[error("required fields unresolved after {attempts} attempts: {}", .missing.join(", "))]
    ValidationFailed { missing: Vec<String>, attempts: u32 },

    #[error("submission confirmation exceeded {max_attempts} attempts")]
    ConfirmationExhausted { max_attempts: u32 },
}

impl FailureReason {
    /// Stable snake_case identifier stored next to the message in the ledger.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::OptimizationExhausted { .. } => "optimization_exhausted",
            FailureReason::MissingPrerequisite(_) => "missing_prerequisite",
            FailureReason::UnsupportedAts(_) => "unsupported_ats",
            FailureReason::SchemaExtraction(_) => "schema_extraction",
            FailureReason::ValidationFailed { .. } => "validation_failed",
            FailureReason::ConfirmationExhausted { .. } => "confirmation_exhausted",
        }
    }
}

/// Errors that end a whole run. Per-job problems are `FailureReason`s instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}
