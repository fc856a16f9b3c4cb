use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::request::{
    InstallFailure, InstallOutcome, InstallPhase, InstallReport, InstallRequest,
    MaterializeStrategy,
};
use crate::core::bundle::{BundleSet, BundleSource, DirectoryBundles};
use crate::core::downloader::Downloader;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::http::build_http_client;
use crate::core::progress::{self, SharedProgress};
use crate::core::server::{
    ArchiveMaterializer, LaunchJarGenerator, MaterializeContext, Materializer,
    RemoteServerFetcher,
};
use crate::core::state::InstallerSettings;
use crate::core::version::{
    FabricMeta, LoaderVersion, ResolvedVersions, VersionCatalog, VersionResolver, VersionSelection,
};

pub const SERVER_JAR_NAME: &str = "server.jar";

/// Sequences version resolution, directory preparation, materialization
/// and the optional server jar download.
///
/// Holds no scheduling primitives: callers either `.await` [`run`] inline
/// or hand it to a worker (see [`super::execution`]).
///
/// [`run`]: InstallOrchestrator::run
pub struct InstallOrchestrator {
    bundled: ArchiveMaterializer,
    generated: LaunchJarGenerator,
    fetcher: RemoteServerFetcher,
    catalog: Arc<dyn VersionCatalog>,
    launch_jar_name: String,
}

impl InstallOrchestrator {
    pub fn from_settings(settings: &InstallerSettings) -> InstallerResult<Self> {
        let client = build_http_client(&settings.user_agent)?;
        let downloader =
            Downloader::new(client.clone()).with_concurrency(settings.library_concurrency);
        let meta = Arc::new(FabricMeta::new(client, &settings.meta_url));

        let bundles: Arc<dyn BundleSource> = match &settings.bundle_dir {
            Some(dir) => Arc::new(DirectoryBundles::new(dir)),
            None => Arc::new(BundleSet::embedded()),
        };

        Ok(Self {
            bundled: ArchiveMaterializer::new(bundles, &settings.bundle_prefix),
            generated: LaunchJarGenerator::new(
                Arc::clone(&meta),
                downloader.clone(),
                &settings.default_maven_url,
                &settings.launch_jar_name,
            ),
            fetcher: RemoteServerFetcher::new(downloader, &settings.version_manifest_url),
            catalog: meta,
            launch_jar_name: settings.launch_jar_name.clone(),
        })
    }

    /// Replace the archive set, keeping the configured prefix.
    pub fn with_bundles(mut self, bundles: Arc<dyn BundleSource>) -> Self {
        let prefix = self.bundled.bundle_prefix().to_string();
        self.bundled = ArchiveMaterializer::new(bundles, prefix);
        self
    }

    /// Replace the source of "latest" version defaults.
    pub fn with_catalog(mut self, catalog: Arc<dyn VersionCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn launch_jar_name(&self) -> &str {
        &self.launch_jar_name
    }

    /// Run one request to a terminal state. Every failure is reported to
    /// `sink` before it is returned; nothing already written is rolled back.
    pub async fn run(&self, request: InstallRequest, sink: SharedProgress) -> InstallOutcome {
        let mut phase = InstallPhase::Idle;

        match self.run_phases(&request, &sink, &mut phase).await {
            Ok(report) => Ok(report),
            Err(error) => {
                error!(
                    "Install into {:?} failed while {}: {}",
                    request.target_dir, phase, error
                );
                sink.report(&progress::failed(&error));
                Err(InstallFailure { phase, error })
            }
        }
    }

    async fn run_phases(
        &self,
        request: &InstallRequest,
        sink: &SharedProgress,
        phase: &mut InstallPhase,
    ) -> InstallerResult<InstallReport> {
        enter(phase, InstallPhase::ResolvingVersions);
        let versions = self.resolve_versions(&request.versions).await?;
        sink.report(&progress::installing_server(
            &versions.loader_version.name,
            Some(&versions.game_version),
        ));

        enter(phase, InstallPhase::PreparingDirectory);
        prepare_directory(&request.target_dir).await?;

        enter(phase, InstallPhase::Materializing);
        let outcome = self
            .materializer(request.strategy, &versions.loader_version)?
            .materialize(MaterializeContext {
                target_dir: &request.target_dir,
                game_version: &versions.game_version,
                loader_version: &versions.loader_version,
                progress: sink,
            })
            .await?;

        let mut server_jar = None;
        if request.download_server {
            enter(phase, InstallPhase::FetchingServerJar);
            sink.report(&progress::downloading_server_jar());
            let dest = request.target_dir.join(SERVER_JAR_NAME);
            self.fetcher
                .fetch(&versions.game_version, &dest, sink.as_ref())
                .await?;
            sink.report(&progress::done());
            server_jar = Some(dest);
        }

        enter(phase, InstallPhase::Completed);
        info!(
            "Installed loader {} for {} into {:?}",
            versions.loader_version.name, versions.game_version, request.target_dir
        );
        sink.report(&progress::done_start_server(&self.launch_jar_name));

        Ok(InstallReport {
            target_dir: request.target_dir.clone(),
            launch_jar: request.target_dir.join(&self.launch_jar_name),
            versions,
            files_written: outcome.files_written,
            server_jar,
            warnings: outcome.warnings,
        })
    }

    async fn resolve_versions(&self, selection: &VersionSelection) -> InstallerResult<ResolvedVersions> {
        let defaults = VersionResolver::defaults_for(selection, self.catalog.as_ref()).await?;
        VersionResolver::resolve(selection, &defaults)
    }

    fn materializer(
        &self,
        strategy: MaterializeStrategy,
        loader: &LoaderVersion,
    ) -> InstallerResult<&dyn Materializer> {
        let use_bundle = match strategy {
            MaterializeStrategy::Bundled => true,
            MaterializeStrategy::Generated => false,
            MaterializeStrategy::Auto => self.bundled.has_archive(loader)?,
        };
        if use_bundle {
            Ok(&self.bundled)
        } else {
            debug!("No bundled archive for loader {}, generating", loader.name);
            Ok(&self.generated)
        }
    }
}

fn enter(phase: &mut InstallPhase, next: InstallPhase) {
    debug!("Install phase: {} -> {}", phase, next);
    *phase = next;
}

async fn prepare_directory(dir: &Path) -> InstallerResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| InstallerError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })
}
