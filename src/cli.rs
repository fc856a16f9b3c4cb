use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::core::install::{
    run_batch, InstallFailure, InstallOrchestrator, InstallOutcome, InstallPhase, InstallRequest,
    MaterializeStrategy,
};
use crate::core::progress::{self, ConsoleProgress, SharedProgress};
use crate::core::state::InstallerSettings;
use crate::core::version::LoaderVersion;

/// Flags historically spelled with a single dash.
const LEGACY_FLAGS: &[&str] = &[
    "dir",
    "mcversion",
    "loader",
    "downloadMinecraft",
    "snapshot",
    "generate",
    "settings",
];

#[derive(Debug, Parser)]
#[command(name = "fabric-server-installer", version, about = "Installs a Fabric dedicated server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install a dedicated server into a directory
    Server(ServerArgs),
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Install directory
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Minecraft version, default latest
    #[arg(long = "mcversion", value_name = "VERSION")]
    pub mc_version: Option<String>,

    /// Loader version, default latest
    #[arg(long, value_name = "VERSION")]
    pub loader: Option<String>,

    /// Also download the vanilla server jar as server.jar
    #[arg(long = "downloadMinecraft")]
    pub download_minecraft: bool,

    /// Let the default Minecraft version be a snapshot
    #[arg(long)]
    pub snapshot: bool,

    /// Always generate the launch jar from loader metadata, even when a
    /// bundled archive exists for the loader
    #[arg(long)]
    pub generate: bool,

    /// Settings file to use instead of the one in the user config dir
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

impl ServerArgs {
    pub fn into_request(self) -> InstallRequest {
        let dir = std::path::absolute(&self.dir).unwrap_or(self.dir);
        let strategy = if self.generate {
            MaterializeStrategy::Generated
        } else {
            MaterializeStrategy::Auto
        };

        let mut request = InstallRequest::new(dir)
            .allow_snapshot(self.snapshot)
            .download_server(self.download_minecraft)
            .strategy(strategy);
        if let Some(game) = self.mc_version {
            request = request.game_version(game);
        }
        if let Some(loader) = self.loader {
            request = request.loader_version(LoaderVersion::new(loader));
        }
        request
    }
}

/// Rewrite `-dir x` style flags to `--dir x` so clap can parse them.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let legacy = arg
                .to_str()
                .filter(|s| is_legacy_flag(s))
                .map(|s| OsString::from(format!("-{s}")));
            legacy.unwrap_or(arg)
        })
        .collect()
}

fn is_legacy_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    LEGACY_FLAGS.contains(&name)
}

/// Batch install: runs inline, returns only once a terminal state is reached.
/// Failures have already been printed through the progress sink.
pub async fn execute(cli: Cli) -> InstallOutcome {
    match cli.command {
        Command::Server(args) => {
            let settings = match &args.settings {
                Some(path) => InstallerSettings::load_from(path),
                None => InstallerSettings::load(),
            };
            let request = args.into_request();
            debug!("Installing server into {:?}", request.target_dir);

            let sink: SharedProgress = Arc::new(ConsoleProgress);
            let orchestrator = match InstallOrchestrator::from_settings(&settings) {
                Ok(orchestrator) => orchestrator,
                Err(error) => {
                    sink.report(&progress::failed(&error));
                    return Err(InstallFailure {
                        phase: InstallPhase::Idle,
                        error,
                    });
                }
            };
            run_batch(&orchestrator, request, sink).await
        }
    }
}
