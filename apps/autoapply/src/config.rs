use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::engine::EngineSettings;
use crate::llm_client::DEFAULT_MODEL;
use crate::optimizer::RetryPolicy;
use crate::submission::greenhouse::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the passthrough optimizer is used.
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub results_dir: PathBuf,
    pub max_retries: u32,
    pub max_submission_attempts: u32,
    pub optimizer_attempts: u32,
    pub optimizer_retry_delay: Duration,
    pub greenhouse_api_base: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            results_dir: optional_env("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("results")),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            max_submission_attempts: parse_env("MAX_SUBMISSION_ATTEMPTS", 2)?,
            optimizer_attempts: parse_env("OPTIMIZER_ATTEMPTS", 3)?,
            optimizer_retry_delay: Duration::from_millis(parse_env(
                "OPTIMIZER_RETRY_DELAY_MS",
                2000,
            )?),
            greenhouse_api_base: optional_env("GREENHOUSE_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_retries: self.max_retries,
            max_submission_attempts: self.max_submission_attempts,
        }
    }

    pub fn optimizer_retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.optimizer_attempts,
            delay: self.optimizer_retry_delay,
        }
    }
}

/// A set, non-blank variable.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
