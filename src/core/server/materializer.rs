use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::extract::extract_zip_file;
use super::{MaterializeContext, MaterializeOutcome, Materializer};
use crate::core::bundle::{archive_name, BundleSource};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::progress::{self, ProgressSink};
use crate::core::version::LoaderVersion;

/// Unpacks the bundled `<prefix>-<loader>.zip` into the target directory
/// through a staging copy that is always removed afterwards.
#[derive(Clone)]
pub struct ArchiveMaterializer {
    bundles: Arc<dyn BundleSource>,
    bundle_prefix: String,
}

impl ArchiveMaterializer {
    pub fn new(bundles: Arc<dyn BundleSource>, bundle_prefix: impl Into<String>) -> Self {
        Self {
            bundles,
            bundle_prefix: bundle_prefix.into(),
        }
    }

    pub fn bundle_prefix(&self) -> &str {
        &self.bundle_prefix
    }

    pub fn archive_name(&self, loader: &LoaderVersion) -> String {
        archive_name(&self.bundle_prefix, loader)
    }

    pub fn has_archive(&self, loader: &LoaderVersion) -> InstallerResult<bool> {
        let archive = self.archive_name(loader);
        self.bundles
            .contains(&archive)
            .map_err(|source| InstallerError::StagingIo {
                path: PathBuf::from(archive),
                source,
            })
    }

    /// Deterministic per (target, loader); rewritten on every run.
    pub fn staging_path(&self, target_dir: &Path, loader: &LoaderVersion) -> PathBuf {
        target_dir.join(self.archive_name(loader))
    }

    /// Blocking implementation. `target_dir` must already exist; the
    /// orchestrator creates it while preparing the directory.
    pub fn materialize_blocking(
        &self,
        target_dir: &Path,
        loader: &LoaderVersion,
        sink: &dyn ProgressSink,
    ) -> InstallerResult<MaterializeOutcome> {
        let archive = self.archive_name(loader);

        let mut reader = self
            .bundles
            .open(&archive)
            .map_err(|source| InstallerError::StagingIo {
                path: PathBuf::from(&archive),
                source,
            })?
            .ok_or_else(|| InstallerError::ArchiveNotFound {
                archive: archive.clone(),
            })?;

        let staging = self.staging_path(target_dir, loader);
        if let Err(e) = stage(&mut reader, &staging) {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }

        sink.report(&progress::extracting_archive(&archive));
        let extracted = extract_zip_file(&staging, target_dir);

        finish_staging(&archive, extracted, std::fs::remove_file(&staging), sink)
    }
}

/// Combine the extraction result with the outcome of deleting the staging
/// file. A failed deletion after a good extraction is only a warning.
fn finish_staging(
    archive: &str,
    extracted: InstallerResult<Vec<PathBuf>>,
    cleanup: std::io::Result<()>,
    sink: &dyn ProgressSink,
) -> InstallerResult<MaterializeOutcome> {
    let files = extracted?;

    let mut warnings = Vec::new();
    if let Err(err) = cleanup {
        let message = progress::staging_cleanup_warning(archive, &err);
        warn!("{}", message);
        sink.report(&message);
        warnings.push(message);
    }

    info!("Extracted {} files from {}", files.len(), archive);
    Ok(MaterializeOutcome {
        files_written: files,
        warnings,
    })
}

/// Copy the archive to `staging`, replacing any previous staging file, and
/// make sure the bytes are on disk before extraction reads them back.
fn stage(reader: &mut dyn std::io::Read, staging: &Path) -> InstallerResult<()> {
    let staging_err = |source| InstallerError::StagingIo {
        path: staging.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::create(staging).map_err(staging_err)?;
    let copied = std::io::copy(reader, &mut file).map_err(staging_err)?;
    file.flush().map_err(staging_err)?;
    file.sync_all().map_err(staging_err)?;

    let on_disk = file.metadata().map_err(staging_err)?.len();
    if on_disk != copied {
        return Err(staging_err(std::io::Error::other(format!(
            "staged {on_disk} bytes, expected {copied}"
        ))));
    }
    Ok(())
}

#[async_trait]
impl Materializer for ArchiveMaterializer {
    async fn materialize(&self, ctx: MaterializeContext<'_>) -> InstallerResult<MaterializeOutcome> {
        let this = self.clone();
        let target_dir = ctx.target_dir.to_path_buf();
        let loader = ctx.loader_version.clone();
        let sink = Arc::clone(ctx.progress);

        tokio::task::spawn_blocking(move || {
            this.materialize_blocking(&target_dir, &loader, sink.as_ref())
        })
        .await?
    }
}
