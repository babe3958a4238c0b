//! CV optimization: tailors the candidate's CV to one job.
//!
//! The engine depends only on the `Optimizer` trait. `LlmOptimizer` is the real
//! backend; `PassthroughOptimizer` is a deterministic, network-free stand-in.
//! Each backend owns its internal retry; the engine's `max_retries` budget is
//! layered on top of it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::llm_client::LlmError;
use crate::models::{Cv, Job, OptimizedCv};

pub mod llm;
pub mod passthrough;
pub mod prompts;

pub use llm::LlmOptimizer;
pub use passthrough::PassthroughOptimizer;

#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Optimizer produced unusable output: {0}")]
    InvalidOutput(String),
}

#[async_trait]
pub trait Optimizer: Send + Sync {
    async fn optimize(&self, cv: &Arc<Cv>, job: &Job) -> Result<OptimizedCv, OptimizationError>;
}

/// Fixed-delay retry budget for a single optimizer call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Runs `op` up to `policy.attempts` times, sleeping `policy.delay` between attempts.
/// Stops early on an error `is_transient` rejects. `op` receives the 1-based attempt number.
pub async fn retry_with_fixed_delay<T, E, F, Fut>(
    policy: RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && is_transient(&e) => {
                warn!(
                    "Attempt {}/{} failed, retrying after {}ms: {e}",
                    attempt,
                    attempts,
                    policy.delay.as_millis()
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
