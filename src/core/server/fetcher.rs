use std::path::Path;

use tracing::info;

use crate::core::downloader::Downloader;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::progress::{self, ProgressSink};
use crate::core::version::{VersionJson, VersionManifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded,
    /// The destination already held a jar with the expected SHA-1.
    AlreadyValid,
}

/// Downloads the vanilla dedicated server jar for a game version.
///
/// Single attempt: any transport failure is returned as-is.
pub struct RemoteServerFetcher {
    downloader: Downloader,
    manifest_url: String,
}

impl RemoteServerFetcher {
    pub fn new(downloader: Downloader, manifest_url: impl Into<String>) -> Self {
        Self {
            downloader,
            manifest_url: manifest_url.into(),
        }
    }

    pub async fn fetch(
        &self,
        game_version: &str,
        destination: &Path,
        sink: &dyn ProgressSink,
    ) -> InstallerResult<FetchOutcome> {
        let client = self.downloader.client();

        let manifest = VersionManifest::fetch(client, &self.manifest_url).await?;
        let entry = manifest
            .find_version(game_version)
            .ok_or_else(|| InstallerError::VersionNotFound(game_version.to_string()))?;

        let version_json = VersionJson::fetch(client, &entry.url).await?;
        let server = version_json.server_download().ok_or_else(|| {
            InstallerError::VersionNotFound(format!("server jar for {game_version}"))
        })?;

        if Downloader::validate_sha1(destination, &server.sha1).await? {
            sink.report(&progress::existing_server_jar_valid());
            return Ok(FetchOutcome::AlreadyValid);
        }

        info!(
            "Downloading server jar {} ({} bytes) to {:?}",
            game_version, server.size, destination
        );
        self.downloader
            .download_file(&server.url, destination, Some(&server.sha1))
            .await?;

        Ok(FetchOutcome::Downloaded)
    }
}
