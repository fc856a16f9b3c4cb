mod artifact;

pub use artifact::MavenArtifact;

/// Repository that hosts Fabric loader, intermediary and their libraries.
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
