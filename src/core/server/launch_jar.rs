// ─── Launch Jar Generation ───
// Builds the server launch jar from the loader's server profile instead of
// a bundled archive: libraries are fetched into `libraries/` and referenced
// from the jar manifest's Class-Path.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use zip::write::SimpleFileOptions;

use super::{MaterializeContext, MaterializeOutcome, Materializer};
use crate::core::downloader::{DownloadEntry, Downloader};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::maven::MavenArtifact;
use crate::core::progress;
use crate::core::version::{FabricMeta, ServerProfile};

const LIBRARIES_DIR: &str = "libraries";
const DEFAULT_LAUNCHER_MAIN_CLASS: &str = "net.fabricmc.loader.impl.launch.server.FabricServerLauncher";
const LAUNCH_PROPERTIES: &str = "fabric-server-launch.properties";
const MANIFEST_LINE_LIMIT: usize = 72;

pub struct LaunchJarGenerator {
    meta: Arc<FabricMeta>,
    downloader: Downloader,
    default_maven: String,
    launch_jar_name: String,
}

impl LaunchJarGenerator {
    pub fn new(
        meta: Arc<FabricMeta>,
        downloader: Downloader,
        default_maven: impl Into<String>,
        launch_jar_name: impl Into<String>,
    ) -> Self {
        Self {
            meta,
            downloader,
            default_maven: default_maven.into(),
            launch_jar_name: launch_jar_name.into(),
        }
    }

    /// Download every profile library not already present.
    /// Returns `/`-separated paths relative to the target directory, in
    /// profile order.
    async fn install_libraries(
        &self,
        profile: &ServerProfile,
        target_dir: &Path,
        ctx: &MaterializeContext<'_>,
    ) -> InstallerResult<(Vec<String>, Vec<PathBuf>)> {
        let libs_dir = target_dir.join(LIBRARIES_DIR);
        tokio::fs::create_dir_all(&libs_dir)
            .await
            .map_err(|source| InstallerError::DirectoryCreation {
                path: libs_dir.clone(),
                source,
            })?;

        let mut class_path = Vec::with_capacity(profile.libraries.len());
        let mut pending = Vec::new();

        for library in &profile.libraries {
            let artifact = MavenArtifact::parse(&library.name)?;
            let dest = libs_dir.join(artifact.local_path());
            class_path.push(format!("{}/{}", LIBRARIES_DIR, artifact.repo_path()));

            if !dest.try_exists().unwrap_or(false) {
                ctx.progress
                    .report(&progress::downloading_library(&library.name));
                let repo = library.url.as_deref().unwrap_or(&self.default_maven);
                pending.push(DownloadEntry {
                    url: artifact.url(repo),
                    dest,
                    sha1: None,
                });
            }
        }

        let downloaded: Vec<PathBuf> = pending.iter().map(|e| e.dest.clone()).collect();
        let failures = self.downloader.download_batch(pending).await;
        if let Some((entry, err)) = failures.into_iter().next() {
            tracing::error!("Library download failed for {}: {}", entry.url, err);
            return Err(err);
        }

        Ok((class_path, downloaded))
    }
}

/// Append one manifest attribute, wrapping at 72 bytes with single-space
/// continuation lines. Splits only on char boundaries.
fn write_manifest_attribute(out: &mut String, name: &str, value: &str) {
    let line = format!("{name}: {value}");
    let mut limit = MANIFEST_LINE_LIMIT;
    let mut current = 0;

    for ch in line.chars() {
        if current + ch.len_utf8() > limit {
            out.push_str("\r\n ");
            current = 0;
            limit = MANIFEST_LINE_LIMIT - 1;
        }
        out.push(ch);
        current += ch.len_utf8();
    }
    out.push_str("\r\n");
}

pub fn build_manifest(launcher_main_class: &str, class_path: &[String]) -> String {
    let mut manifest = String::new();
    write_manifest_attribute(&mut manifest, "Manifest-Version", "1.0");
    write_manifest_attribute(&mut manifest, "Main-Class", launcher_main_class);
    if !class_path.is_empty() {
        write_manifest_attribute(&mut manifest, "Class-Path", &class_path.join(" "));
    }
    manifest.push_str("\r\n");
    manifest
}

/// In-memory launch jar. Entries carry a fixed timestamp so identical
/// inputs give identical bytes.
pub fn build_launch_jar(
    launcher_main_class: &str,
    main_class: &str,
    class_path: &[String],
) -> InstallerResult<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    let write_err = |source: std::io::Error| InstallerError::Unexpected(format!("launch jar: {source}"));

    let mut jar = zip::ZipWriter::new(Cursor::new(Vec::new()));

    jar.start_file("META-INF/MANIFEST.MF", options)?;
    jar.write_all(build_manifest(launcher_main_class, class_path).as_bytes())
        .map_err(write_err)?;

    jar.start_file(LAUNCH_PROPERTIES, options)?;
    jar.write_all(format!("launch.mainClass={main_class}\n").as_bytes())
        .map_err(write_err)?;

    Ok(jar.finish()?.into_inner())
}

#[async_trait]
impl Materializer for LaunchJarGenerator {
    async fn materialize(&self, ctx: MaterializeContext<'_>) -> InstallerResult<MaterializeOutcome> {
        info!(
            "Generating launch jar for loader {} on {}",
            ctx.loader_version.name, ctx.game_version
        );

        let profile = self
            .meta
            .server_profile(ctx.game_version, &ctx.loader_version.name)
            .await?;

        ctx.progress.report(&progress::downloading_libraries());
        let (class_path, mut written) = self
            .install_libraries(&profile, ctx.target_dir, &ctx)
            .await?;

        ctx.progress.report(&progress::generating_launch_jar());
        let launcher_main_class = profile
            .launcher_main_class
            .as_deref()
            .unwrap_or(DEFAULT_LAUNCHER_MAIN_CLASS);
        let jar = build_launch_jar(launcher_main_class, &profile.main_class, &class_path)?;

        let jar_path = ctx.target_dir.join(&self.launch_jar_name);
        tokio::fs::write(&jar_path, jar)
            .await
            .map_err(|source| InstallerError::FileWrite {
                path: jar_path.clone(),
                source,
            })?;
        written.push(jar_path);

        Ok(MaterializeOutcome {
            files_written: written,
            warnings: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn short_attributes_stay_on_one_line() {
        let manifest = build_manifest("a.b.Main", &[]);
        assert_eq!(manifest, "Manifest-Version: 1.0\r\nMain-Class: a.b.Main\r\n\r\n");
    }

    #[test]
    fn long_class_path_wraps_at_72_bytes() {
        let class_path: Vec<String> = (0..6)
            .map(|i| format!("libraries/org/example/lib{i}/1.0/lib{i}-1.0.jar"))
            .collect();

        let manifest = build_manifest(DEFAULT_LAUNCHER_MAIN_CLASS, &class_path);

        for line in manifest.split("\r\n") {
            assert!(line.len() <= 72, "line too long: {line:?}");
        }
        let unwrapped = manifest.replace("\r\n ", "");
        assert!(unwrapped.contains(&format!("Class-Path: {}", class_path.join(" "))));
    }

    #[test]
    fn launch_jar_contains_manifest_and_properties() {
        let jar = build_launch_jar(
            DEFAULT_LAUNCHER_MAIN_CLASS,
            "net.fabricmc.loader.impl.launch.knot.KnotServer",
            &["libraries/a/b/1/b-1.jar".to_string()],
        )
        .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(jar)).unwrap();
        let mut props = String::new();
        archive
            .by_name(LAUNCH_PROPERTIES)
            .unwrap()
            .read_to_string(&mut props)
            .unwrap();
        let mut manifest = String::new();
        archive
            .by_name("META-INF/MANIFEST.MF")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();

        assert_eq!(props, "launch.mainClass=net.fabricmc.loader.impl.launch.knot.KnotServer\n");
        assert!(manifest.contains("Class-Path: libraries/a/b/1/b-1.jar\r\n"));
    }

    #[test]
    fn launch_jar_is_reproducible() {
        let class_path = vec!["libraries/a/b/1/b-1.jar".to_string()];
        let first = build_launch_jar("x.Launcher", "x.Main", &class_path).unwrap();
        let second = build_launch_jar("x.Launcher", "x.Main", &class_path).unwrap();
        assert_eq!(first, second);
    }
}
