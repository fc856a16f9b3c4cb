pub mod manifest;
pub mod meta;
pub mod resolver;
pub mod version_file;

pub use manifest::{VersionEntry, VersionManifest};
pub use meta::{FabricMeta, MetaVersion, ProfileLibrary, ServerProfile};
pub use resolver::{
    LoaderVersion, ResolvedVersions, VersionCatalog, VersionDefaults, VersionResolver,
    VersionSelection,
};
pub use version_file::{DownloadArtifact, VersionJson};
