use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::error::{ErrorKind, InstallerError};
use crate::core::version::{LoaderVersion, ResolvedVersions, VersionSelection};

/// How the server layout is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaterializeStrategy {
    /// Unpack the bundled `<prefix>-<loader>.zip`.
    #[default]
    Bundled,
    /// Fetch libraries and write a launch jar from the loader's server profile.
    Generated,
    /// Bundled when an archive exists for the loader, generated otherwise.
    Auto,
}

/// One install, passed by value through the pipeline.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub target_dir: PathBuf,
    pub versions: VersionSelection,
    pub download_server: bool,
    pub strategy: MaterializeStrategy,
}

impl InstallRequest {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            versions: VersionSelection::default(),
            download_server: false,
            strategy: MaterializeStrategy::default(),
        }
    }

    pub fn game_version(mut self, version: impl Into<String>) -> Self {
        self.versions.game_version = Some(version.into());
        self
    }

    pub fn loader_version(mut self, loader: LoaderVersion) -> Self {
        self.versions.loader_version = Some(loader);
        self
    }

    pub fn allow_snapshot(mut self, allow: bool) -> Self {
        self.versions.allow_snapshot = allow;
        self
    }

    pub fn download_server(mut self, download: bool) -> Self {
        self.download_server = download;
        self
    }

    pub fn strategy(mut self, strategy: MaterializeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn has_loader(&self) -> bool {
        self.versions
            .loader_version
            .as_ref()
            .is_some_and(|l| !l.name.trim().is_empty())
    }
}

/// Pipeline states. Linear; `Failed` is reported through [`InstallFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Idle,
    ResolvingVersions,
    PreparingDirectory,
    Materializing,
    FetchingServerJar,
    Completed,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallPhase::Idle => "idle",
            InstallPhase::ResolvingVersions => "resolving versions",
            InstallPhase::PreparingDirectory => "preparing directory",
            InstallPhase::Materializing => "materializing",
            InstallPhase::FetchingServerJar => "fetching server jar",
            InstallPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Terminal success state.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub target_dir: PathBuf,
    pub versions: ResolvedVersions,
    pub launch_jar: PathBuf,
    pub files_written: Vec<PathBuf>,
    /// `Some` only when the server jar was requested and is in place.
    pub server_jar: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Terminal failure state: the first error and the phase it ended.
#[derive(Debug, Error)]
#[error("install failed while {phase}: {error}")]
pub struct InstallFailure {
    pub phase: InstallPhase,
    #[source]
    pub error: InstallerError,
}

impl InstallFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

pub type InstallOutcome = Result<InstallReport, InstallFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let request = InstallRequest::new("/tmp/srv");
        assert!(!request.download_server);
        assert_eq!(request.strategy, MaterializeStrategy::Bundled);
        assert!(!request.has_loader());
    }

    #[test]
    fn failure_message_names_phase() {
        let failure = InstallFailure {
            phase: InstallPhase::Materializing,
            error: InstallerError::ArchiveNotFound {
                archive: "bundle-bogus.zip".into(),
            },
        };
        assert_eq!(failure.kind(), ErrorKind::ArchiveNotFound);
        assert_eq!(
            failure.to_string(),
            "install failed while materializing: No bundled server archive named bundle-bogus.zip"
        );
    }
}
