pub mod extract;
pub mod fetcher;
pub mod launch_jar;
pub mod materializer;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::error::InstallerResult;
use crate::core::progress::SharedProgress;
use crate::core::version::LoaderVersion;

pub use fetcher::{FetchOutcome, RemoteServerFetcher};
pub use launch_jar::LaunchJarGenerator;
pub use materializer::ArchiveMaterializer;

/// Everything a materializer needs for one install.
pub struct MaterializeContext<'a> {
    pub target_dir: &'a Path,
    pub game_version: &'a str,
    pub loader_version: &'a LoaderVersion,
    pub progress: &'a SharedProgress,
}

#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    pub files_written: Vec<PathBuf>,
    /// Non-fatal problems, already reported to the progress sink.
    pub warnings: Vec<String>,
}

/// Produces the installed server layout under the target directory.
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(&self, ctx: MaterializeContext<'_>) -> InstallerResult<MaterializeOutcome>;
}
