use async_trait::async_trait;
use tracing::debug;

use super::{LedgerError, RunLedger, RunSink};
use crate::errors::FailureReason;
use crate::models::Job;

/// In-memory sink. Used for dry runs that should leave nothing on disk, and in tests.
#[derive(Debug)]
pub struct MemorySink {
    ledger: RunLedger,
    saves: usize,
}

impl MemorySink {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            ledger: RunLedger::new(candidate),
            saves: 0,
        }
    }

    /// How many times `save` has been called.
    #[cfg(test)]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

#[async_trait]
impl RunSink for MemorySink {
    fn record_success(&mut self, job: &Job) {
        self.ledger.record_success(job);
    }

    fn record_failure(&mut self, job: &Job, reason: &FailureReason) {
        self.ledger.record_failure(job, reason);
    }

    async fn save(&mut self) -> Result<(), LedgerError> {
        self.ledger.finalize();
        self.saves += 1;
        debug!(
            "In-memory ledger finalized | run_id={} | saves={}",
            self.ledger.run_id, self.saves
        );
        Ok(())
    }

    fn ledger(&self) -> &RunLedger {
        &self.ledger
    }
}
