use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{LedgerError, RunLedger, RunSink};
use crate::errors::FailureReason;
use crate::models::Job;

/// JSON-file ledger at `<results_dir>/<run_id>.json`.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so a crash mid-save never leaves a truncated ledger behind.
#[derive(Debug)]
pub struct ResultStore {
    ledger: RunLedger,
    path: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: impl AsRef<Path>, candidate: impl Into<String>) -> Self {
        let ledger = RunLedger::new(candidate);
        let path = results_dir.as_ref().join(format!("{}.json", ledger.run_id));
        Self { ledger, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a previously saved ledger.
    pub async fn load(path: impl AsRef<Path>) -> Result<RunLedger, LedgerError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RunSink for ResultStore {
    fn record_success(&mut self, job: &Job) {
        self.ledger.record_success(job);
    }

    fn record_failure(&mut self, job: &Job, reason: &FailureReason) {
        self.ledger.record_failure(job, reason);
    }

    async fn save(&mut self) -> Result<(), LedgerError> {
        self.ledger.finalize();

        let snapshot = self.ledger.clone();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&snapshot, &path)).await??;

        info!(
            "Ledger saved | run_id={} path={} entries={}",
            self.ledger.run_id,
            self.path.display(),
            self.ledger.jobs.len()
        );
        Ok(())
    }

    fn ledger(&self) -> &RunLedger {
        &self.ledger
    }
}

/// Writes `ledger` to a temp file next to `path`, then renames it into place.
fn write_atomically(ledger: &RunLedger, path: &Path) -> Result<(), LedgerError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, ledger)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
