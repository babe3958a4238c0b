use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::engine::{Engine, RunReport, RunState};
use crate::errors::AppError;
use crate::ledger::RunSink;
use crate::submission::FormExecutor;

/// Runs the engine once, then closes the form executor if the run opened it.
///
/// The executor is closed on every exit path: a normal return, an engine error,
/// or a panic raised by a collaborator. A panic is resumed once the executor is
/// closed; an engine error wins over a close error.
pub async fn execute_run(
    engine: &Engine,
    executor: &dyn FormExecutor,
    state: &mut RunState,
    sink: &mut dyn RunSink,
) -> Result<RunReport, AppError> {
    let outcome = AssertUnwindSafe(engine.run(state, sink)).catch_unwind().await;
    if outcome.is_err() {
        error!("Run aborted by a panic, releasing the form executor");
    }

    let closed = match state.take_executor_handle() {
        Some(handle) => {
            let id = handle.id;
            let result = executor.close(handle).await;
            match &result {
                Ok(()) => info!("Form executor closed | session={}", id),
                Err(e) => warn!("Form executor close failed | session={} | error={}", id, e),
            }
            result
        }
        None => Ok(()),
    };

    let report = match outcome {
        Ok(result) => result?,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    closed?;
    Ok(report)
}
