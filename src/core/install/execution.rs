// ─── Execution Strategies ───
// The orchestrator is scheduling-agnostic; these are the two ways callers
// drive it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::orchestrator::InstallOrchestrator;
use super::request::{InstallOutcome, InstallRequest};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::progress::SharedProgress;

/// Batch mode: run inline and hand the terminal state back to the caller,
/// which decides the process exit status from it.
pub async fn run_batch(
    orchestrator: &InstallOrchestrator,
    request: InstallRequest,
    sink: SharedProgress,
) -> InstallOutcome {
    orchestrator.run(request, sink).await
}

/// Interactive mode: each install runs on its own worker task so the
/// triggering thread returns immediately.
///
/// Enforces single flight the way an install button would: while one install
/// is running, further `start` calls are rejected. The guard is released
/// once the task reaches a terminal state, whatever that state is.
#[derive(Clone)]
pub struct InteractiveInstaller {
    orchestrator: Arc<InstallOrchestrator>,
    in_flight: Arc<AtomicBool>,
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl InteractiveInstaller {
    pub fn new(orchestrator: Arc<InstallOrchestrator>) -> Self {
        Self {
            orchestrator,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the controlling element should currently be disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Spawn the install on the current tokio runtime.
    ///
    /// Returns `Ok(None)` without doing anything when no loader version is
    /// selected, and `Err(InstallBusy)` while another install is in flight.
    pub fn start(
        &self,
        request: InstallRequest,
        sink: SharedProgress,
    ) -> InstallerResult<Option<JoinHandle<InstallOutcome>>> {
        if !request.has_loader() {
            debug!("No loader version selected, ignoring install request");
            return Ok(None);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(InstallerError::InstallBusy);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let orchestrator = Arc::clone(&self.orchestrator);

        Ok(Some(tokio::spawn(async move {
            let _guard = guard;
            orchestrator.run(request, sink).await
        })))
    }
}
