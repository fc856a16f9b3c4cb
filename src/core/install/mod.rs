pub mod execution;
pub mod orchestrator;
pub mod request;

pub use execution::{run_batch, InteractiveInstaller};
pub use orchestrator::{InstallOrchestrator, SERVER_JAR_NAME};
pub use request::{
    InstallFailure, InstallOutcome, InstallPhase, InstallReport, InstallRequest,
    MaterializeStrategy,
};
