// ─── Version File ───
// The slice of a Mojang version JSON the server installer needs.

use serde::Deserialize;

use crate::core::error::{InstallerError, InstallerResult};

#[derive(Debug, Deserialize)]
pub struct VersionJson {
    pub id: Option<String>,
    pub downloads: Option<VersionDownloads>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

impl VersionJson {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> InstallerResult<Self> {
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(InstallerError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// Dedicated server download, absent for versions that never shipped one.
    pub fn server_download(&self) -> Option<&DownloadArtifact> {
        self.downloads.as_ref().and_then(|d| d.server.as_ref())
    }
}
