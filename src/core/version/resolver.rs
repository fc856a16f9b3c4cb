// ─── Version Resolution ───
// Turns user input plus catalog defaults into a concrete (game, loader) pair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{InstallerError, InstallerResult};

/// A specific loader build. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderVersion {
    pub name: String,
    #[serde(default)]
    pub stable: Option<bool>,
}

impl LoaderVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stable: None,
        }
    }
}

/// Source of "latest" defaults. Ordering is whatever the source reports.
#[async_trait]
pub trait VersionCatalog: Send + Sync {
    async fn latest_game_version(&self, allow_snapshot: bool) -> InstallerResult<Option<String>>;
    async fn latest_loader_version(&self) -> InstallerResult<Option<LoaderVersion>>;
}

/// What the user asked for. `None` means "latest".
#[derive(Debug, Clone, Default)]
pub struct VersionSelection {
    pub game_version: Option<String>,
    pub loader_version: Option<LoaderVersion>,
    pub allow_snapshot: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VersionDefaults {
    pub latest_game: Option<String>,
    pub latest_loader: Option<LoaderVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub game_version: String,
    pub loader_version: LoaderVersion,
}

pub struct VersionResolver;

impl VersionResolver {
    /// Pure resolution, no I/O.
    pub fn resolve(
        selection: &VersionSelection,
        defaults: &VersionDefaults,
    ) -> InstallerResult<ResolvedVersions> {
        let loader_version = explicit_loader(selection)
            .or_else(|| defaults.latest_loader.clone())
            .ok_or(InstallerError::MissingLoaderVersion)?;

        let game_version = explicit_game(selection)
            .or_else(|| defaults.latest_game.clone())
            .ok_or_else(|| {
                InstallerError::VersionNotFound(if selection.allow_snapshot {
                    "latest game version".into()
                } else {
                    "latest stable game version".into()
                })
            })?;

        Ok(ResolvedVersions {
            game_version,
            loader_version,
        })
    }

    /// Ask `catalog` only for the fields the selection leaves open.
    pub async fn defaults_for(
        selection: &VersionSelection,
        catalog: &dyn VersionCatalog,
    ) -> InstallerResult<VersionDefaults> {
        let mut defaults = VersionDefaults::default();

        if explicit_loader(selection).is_none() {
            defaults.latest_loader = catalog.latest_loader_version().await?;
            if let Some(loader) = &defaults.latest_loader {
                info!("Using latest loader version {}", loader.name);
            }
        }

        if explicit_game(selection).is_none() {
            defaults.latest_game = catalog
                .latest_game_version(selection.allow_snapshot)
                .await?;
            if let Some(game) = &defaults.latest_game {
                info!("Using latest game version {}", game);
            }
        }

        Ok(defaults)
    }
}

fn explicit_loader(selection: &VersionSelection) -> Option<LoaderVersion> {
    selection
        .loader_version
        .clone()
        .filter(|l| !l.name.trim().is_empty())
}

fn explicit_game(selection: &VersionSelection) -> Option<String> {
    selection
        .game_version
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
}
