use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installer backend.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── Versions ────────────────────────────────────────
    #[error("No loader version selected")]
    MissingLoaderVersion,

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    // ── Bundled archive ─────────────────────────────────
    #[error("No bundled server archive named {archive}")]
    ArchiveNotFound { archive: String },

    #[error("Cannot create directory {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Staging file error at {path:?}: {source}")]
    StagingIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Zip extraction error: {0}")]
    Extraction(#[from] zip::result::ZipError),

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Local files ─────────────────────────────────────
    #[error("Cannot write {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Metadata ────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Scheduling ──────────────────────────────────────
    #[error("An installation is already running")]
    InstallBusy,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Unexpected(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingLoaderVersion,
    ArchiveNotFound,
    DirectoryCreationError,
    StagingIoError,
    VersionNotFound,
    NetworkError,
    FileWriteError,
    UnexpectedFailure,
}

impl InstallerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallerError::MissingLoaderVersion => ErrorKind::MissingLoaderVersion,
            InstallerError::VersionNotFound(_) => ErrorKind::VersionNotFound,
            InstallerError::ArchiveNotFound { .. } => ErrorKind::ArchiveNotFound,
            InstallerError::DirectoryCreation { .. } => ErrorKind::DirectoryCreationError,
            InstallerError::StagingIo { .. } | InstallerError::Extraction(_) => {
                ErrorKind::StagingIoError
            }
            InstallerError::Network(_) | InstallerError::HttpStatus { .. } => {
                ErrorKind::NetworkError
            }
            InstallerError::FileWrite { .. } | InstallerError::Sha1Mismatch { .. } => {
                ErrorKind::FileWriteError
            }
            InstallerError::InvalidMavenCoordinate(_)
            | InstallerError::Json(_)
            | InstallerError::InstallBusy
            | InstallerError::Unexpected(_) => ErrorKind::UnexpectedFailure,
        }
    }
}

impl From<tokio::task::JoinError> for InstallerError {
    fn from(err: tokio::task::JoinError) -> Self {
        InstallerError::Unexpected(format!("install task aborted: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_is_a_network_error() {
        let err = InstallerError::HttpStatus {
            url: "https://example.com/server.jar".into(),
            status: 503,
        };
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn checksum_mismatch_is_a_write_error() {
        let err = InstallerError::Sha1Mismatch {
            path: PathBuf::from("server.jar"),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(err.kind(), ErrorKind::FileWriteError);
    }
}
