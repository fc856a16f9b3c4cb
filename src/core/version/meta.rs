// ─── Loader Metadata ───
// Fabric Meta v2: game/loader version lists and per-version server profiles.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::resolver::{LoaderVersion, VersionCatalog};
use crate::core::error::{InstallerError, InstallerResult};

/// One row of `/v2/versions/game` or `/v2/versions/loader`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaVersion {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
}

/// Server launch profile for one (game, loader) pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    pub main_class: String,
    #[serde(default)]
    pub launcher_main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<ProfileLibrary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileLibrary {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

pub struct FabricMeta {
    client: reqwest::Client,
    base_url: String,
}

impl FabricMeta {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn game_versions(&self) -> InstallerResult<Vec<MetaVersion>> {
        self.get_json("v2/versions/game").await
    }

    pub async fn loader_versions(&self) -> InstallerResult<Vec<MetaVersion>> {
        self.get_json("v2/versions/loader").await
    }

    pub async fn server_profile(
        &self,
        game_version: &str,
        loader_version: &str,
    ) -> InstallerResult<ServerProfile> {
        let path = format!("v2/versions/loader/{game_version}/{loader_version}/server/json");
        match self.get_json::<ServerProfile>(&path).await {
            Err(InstallerError::HttpStatus { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16()
                    || status == StatusCode::BAD_REQUEST.as_u16() =>
            {
                Err(InstallerError::VersionNotFound(format!(
                    "loader {loader_version} for game {game_version}"
                )))
            }
            other => other,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> InstallerResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(InstallerError::HttpStatus {
                url,
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<T>().await?)
    }
}

/// First stable entry (or first entry at all when unstable is allowed),
/// in the order the service returns them.
fn first_matching(versions: Vec<MetaVersion>, allow_unstable: bool) -> Option<MetaVersion> {
    versions.into_iter().find(|v| allow_unstable || v.stable)
}

#[async_trait]
impl VersionCatalog for FabricMeta {
    async fn latest_game_version(&self, allow_snapshot: bool) -> InstallerResult<Option<String>> {
        let versions = self.game_versions().await?;
        Ok(first_matching(versions, allow_snapshot).map(|v| v.version))
    }

    async fn latest_loader_version(&self) -> InstallerResult<Option<LoaderVersion>> {
        let versions = self.loader_versions().await?;
        Ok(first_matching(versions, false).map(|v| LoaderVersion {
            name: v.version,
            stable: Some(v.stable),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn meta_with(route: &str, body: serde_json::Value) -> (MockServer, FabricMeta) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let meta = FabricMeta::new(reqwest::Client::new(), server.uri());
        (server, meta)
    }

    #[tokio::test]
    async fn latest_game_skips_snapshots_unless_allowed() {
        let (_server, meta) = meta_with(
            "/v2/versions/game",
            serde_json::json!([
                { "version": "22w42a", "stable": false },
                { "version": "1.19.2", "stable": true },
                { "version": "1.19.1", "stable": true }
            ]),
        )
        .await;

        assert_eq!(
            meta.latest_game_version(false).await.unwrap().as_deref(),
            Some("1.19.2")
        );
        assert_eq!(
            meta.latest_game_version(true).await.unwrap().as_deref(),
            Some("22w42a")
        );
    }

    #[tokio::test]
    async fn latest_loader_is_first_stable() {
        let (_server, meta) = meta_with(
            "/v2/versions/loader",
            serde_json::json!([
                { "separator": ".", "build": 11, "maven": "net.fabricmc:fabric-loader:0.14.11-beta",
                  "version": "0.14.11-beta", "stable": false },
                { "separator": ".", "build": 10, "maven": "net.fabricmc:fabric-loader:0.14.10",
                  "version": "0.14.10", "stable": true }
            ]),
        )
        .await;

        let loader = meta.latest_loader_version().await.unwrap().unwrap();

        assert_eq!(loader.name, "0.14.10");
        assert_eq!(loader.stable, Some(true));
    }

    #[tokio::test]
    async fn unknown_server_profile_is_version_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        let meta = FabricMeta::new(reqwest::Client::new(), server.uri());

        let err = meta.server_profile("1.19.2", "bogus").await.unwrap_err();

        assert!(matches!(err, InstallerError::VersionNotFound(_)));
    }

    #[tokio::test]
    async fn server_profile_parses_libraries() {
        let (_server, meta) = meta_with(
            "/v2/versions/loader/1.19.2/0.14.9/server/json",
            serde_json::json!({
                "id": "fabric-loader-0.14.9-1.19.2",
                "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotServer",
                "launcherMainClass": "net.fabricmc.loader.impl.launch.server.FabricServerLauncher",
                "libraries": [
                    { "name": "net.fabricmc:intermediary:1.19.2", "url": "https://maven.fabricmc.net/" },
                    { "name": "org.ow2.asm:asm:9.3" }
                ]
            }),
        )
        .await;

        let profile = meta.server_profile("1.19.2", "0.14.9").await.unwrap();

        assert_eq!(profile.libraries.len(), 2);
        assert!(profile.libraries[1].url.is_none());
        assert_eq!(
            profile.launcher_main_class.as_deref(),
            Some("net.fabricmc.loader.impl.launch.server.FabricServerLauncher")
        );
    }
}
