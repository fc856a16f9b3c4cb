use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "FabricServerInstaller";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_META_URL: &str = "https://meta.fabricmc.net";
pub const DEFAULT_VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const DEFAULT_LAUNCH_JAR_NAME: &str = "fabric-server-launch.jar";
pub const DEFAULT_BUNDLE_PREFIX: &str = "fabric-server";

/// Installer-wide settings, persisted as `settings.json` in the user config dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallerSettings {
    /// Base URL of the loader metadata service.
    pub meta_url: String,
    /// Mojang version manifest used to locate server jars.
    pub version_manifest_url: String,
    /// Repository for libraries whose profile entry carries no URL.
    pub default_maven_url: String,
    /// Archive names are `<bundle_prefix>-<loader>.zip`.
    pub bundle_prefix: String,
    /// Serve archives from this directory instead of the compiled-in set.
    pub bundle_dir: Option<PathBuf>,
    pub launch_jar_name: String,
    pub library_concurrency: usize,
    pub user_agent: String,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            meta_url: DEFAULT_META_URL.to_string(),
            version_manifest_url: DEFAULT_VERSION_MANIFEST_URL.to_string(),
            default_maven_url: crate::core::maven::FABRIC_MAVEN.to_string(),
            bundle_prefix: DEFAULT_BUNDLE_PREFIX.to_string(),
            bundle_dir: None,
            launch_jar_name: DEFAULT_LAUNCH_JAR_NAME.to_string(),
            library_concurrency: 8,
            user_agent: concat!("FabricServerInstaller/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl InstallerSettings {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match default_settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`. A missing file yields defaults; a corrupt one is
    /// logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No settings at {:?}, using defaults", path);
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring corrupt settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn meta_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.meta_url.trim_end_matches('/'), path)
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join(APP_DIR_NAME).join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = InstallerSettings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, InstallerSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "bundle_prefix": "bundle" }"#).unwrap();

        let settings = InstallerSettings::load_from(&path);

        assert_eq!(settings.bundle_prefix, "bundle");
        assert_eq!(settings.launch_jar_name, DEFAULT_LAUNCH_JAR_NAME);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(
            InstallerSettings::load_from(&path),
            InstallerSettings::default()
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = InstallerSettings {
            bundle_dir: Some(PathBuf::from("/opt/bundles")),
            ..InstallerSettings::default()
        };

        settings.save_to(&path).unwrap();

        assert_eq!(InstallerSettings::load_from(&path), settings);
    }

    #[test]
    fn meta_endpoint_joins_without_double_slash() {
        let settings = InstallerSettings {
            meta_url: "http://localhost:1234/".into(),
            ..InstallerSettings::default()
        };
        assert_eq!(
            settings.meta_endpoint("v2/versions/game"),
            "http://localhost:1234/v2/versions/game"
        );
    }
}
