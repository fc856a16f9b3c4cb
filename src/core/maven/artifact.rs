use std::fmt;
use std::path::PathBuf;

use crate::core::error::{InstallerError, InstallerResult};

/// A parsed Maven coordinate as found in loader server profiles.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   either of the above with an `@packaging` suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> InstallerResult<Self> {
        let (coord_part, packaging_override) = match coord.rsplit_once('@') {
            Some((head, packaging)) => (head, Some(packaging)),
            None => (coord, None),
        };

        let invalid = || InstallerError::InvalidMavenCoordinate(coord.to_string());

        let parts: Vec<&str> = coord_part.split(':').collect();
        // Every part becomes a path segment under `libraries/`.
        if !parts[0].split('.').all(is_path_segment)
            || !parts[1..].iter().all(|p| is_path_segment(p))
            || !packaging_override.map_or(true, is_path_segment)
        {
            return Err(invalid());
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(invalid()),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            packaging: packaging_override.unwrap_or("jar").to_string(),
        })
    }

    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `artifactId-version[-classifier].packaging`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// Repository-relative path, always `/`-separated.
    pub fn repo_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repo_path())
    }

    /// Path relative to a `libraries/` directory, in the local OS layout.
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }
}

fn is_path_segment(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        if self.packaging != "jar" {
            write!(f, "@{}", self.packaging)?;
        }
        Ok(())
    }
}
