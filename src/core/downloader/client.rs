use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{InstallerError, InstallerResult};

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone)]
pub struct DownloadEntry {
    pub url: String,
    pub dest: PathBuf,
    pub sha1: Option<String>,
}

/// Single-attempt streaming downloader.
///
/// Content is written to `<dest>.tmp` and renamed onto `dest` only after
/// it has been fully received (and validated when a SHA-1 is given), so a
/// failed transfer never clobbers an existing file.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads in a batch.
    concurrency: usize,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: 8,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // ── Single file download ────────────────────────────

    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> InstallerResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| InstallerError::DirectoryCreation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let tmp = temp_path(dest);
        let result = write_stream(response, &tmp, dest, sha1_expected).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
            return result;
        }

        tokio::fs::rename(&tmp, dest)
            .await
            .map_err(|source| InstallerError::FileWrite {
                path: dest.to_path_buf(),
                source,
            })?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Download many files concurrently using `buffer_unordered`.
    ///
    /// Returns the entries that failed, if any.
    pub async fn download_batch(
        &self,
        entries: Vec<DownloadEntry>,
    ) -> Vec<(DownloadEntry, InstallerError)> {
        info!(
            "Starting batch download: {} files, concurrency={}",
            entries.len(),
            self.concurrency
        );

        let results: Vec<_> = stream::iter(entries)
            .map(|entry| async move {
                let result = self
                    .download_file(&entry.url, &entry.dest, entry.sha1.as_deref())
                    .await;
                (entry, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(entry, result)| match result {
                Ok(()) => None,
                Err(e) => Some((entry, e)),
            })
            .collect()
    }

    /// Validate an existing file's SHA-1. A missing file is simply invalid.
    pub async fn validate_sha1(path: &Path, expected: &str) -> InstallerResult<bool> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(InstallerError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(sha1_hex(&bytes).eq_ignore_ascii_case(expected))
    }
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

async fn write_stream(
    response: reqwest::Response,
    tmp: &Path,
    dest: &Path,
    sha1_expected: Option<&str>,
) -> InstallerResult<()> {
    let write_err = |source| InstallerError::FileWrite {
        path: tmp.to_path_buf(),
        source,
    };

    let mut hasher = Sha1::new();
    let mut body = response.bytes_stream();

    // Scoped so the handle is closed before the rename.
    {
        let mut file = tokio::fs::File::create(tmp).await.map_err(write_err)?;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            file.write_all(&chunk).await.map_err(write_err)?;
        }
        file.flush().await.map_err(write_err)?;
    }

    if let Some(expected) = sha1_expected {
        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(InstallerError::Sha1Mismatch {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> Downloader {
        Downloader::new(Client::new())
    }

    #[tokio::test]
    async fn downloads_and_validates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("sub").join("file.bin");
        let expected = sha1_hex(b"payload");

        downloader()
            .download_file(&format!("{}/file.bin", server.uri()), &dest, Some(&expected))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert!(!temp_path(&dest).exists());
    }

    #[tokio::test]
    async fn checksum_mismatch_keeps_previous_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("server.jar");
        std::fs::write(&dest, b"old").unwrap();

        let err = downloader()
            .download_file(&format!("{}/x", server.uri()), &dest, Some("00"))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::Sha1Mismatch { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
        assert!(!temp_path(&dest).exists());
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader()
            .download_file(&format!("{}/missing", server.uri()), &dir.path().join("f"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn validate_sha1_of_missing_file_is_false() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Downloader::validate_sha1(&dir.path().join("none"), "00")
            .await
            .unwrap());
    }
}
