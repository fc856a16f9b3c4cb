// ─── Fabric Server Installer Core ───
// Installs a Fabric dedicated server into a directory.
//
// Architecture:
//   core/
//     install/    : Request model, orchestrator, batch and interactive runners
//     version/    : Version selection, Fabric Meta catalog, Mojang manifest
//     server/     : Bundled archive extraction, launch jar generation, server jar fetch
//     bundle/     : Archive sources (embedded at build time or a directory)
//     downloader/ : Streaming downloads with SHA-1 validation
//     maven/      : Maven coordinate parsing for loader libraries
//     progress    : Human-readable progress messages and sinks
//     state/      : Persisted installer settings

pub mod bundle;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod maven;
pub mod progress;
pub mod server;
pub mod state;
pub mod version;
