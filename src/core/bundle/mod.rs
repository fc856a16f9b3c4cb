// ─── Bundled Server Archives ───
// Read-only archive sets keyed by exact file name
// (`<prefix>-<loader>.zip`).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::core::version::LoaderVersion;

mod embedded {
    include!(concat!(env!("OUT_DIR"), "/bundled_archives.rs"));
}

pub type BundleReader = Box<dyn Read + Send>;

/// A read-only set of server archives.
pub trait BundleSource: Send + Sync {
    /// `Ok(None)` when no archive of that name exists.
    fn open(&self, name: &str) -> std::io::Result<Option<BundleReader>>;

    fn contains(&self, name: &str) -> std::io::Result<bool> {
        Ok(self.open(name)?.is_some())
    }
}

pub fn archive_name(prefix: &str, loader: &LoaderVersion) -> String {
    format!("{}-{}.zip", prefix, loader.name)
}

/// Archives held in memory: the compiled-in set, or one assembled by hand.
#[derive(Debug, Clone, Default)]
pub struct BundleSet {
    archives: BTreeMap<String, Cow<'static, [u8]>>,
}

impl BundleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives found under `resources/bundles/` at build time.
    pub fn embedded() -> Self {
        let archives = embedded::BUNDLED_ARCHIVES
            .iter()
            .map(|(name, bytes)| (name.to_string(), Cow::Borrowed(*bytes)))
            .collect();
        Self { archives }
    }

    pub fn with_archive(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.archives.insert(name.into(), Cow::Owned(bytes));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.archives.keys().map(String::as_str)
    }
}

impl BundleSource for BundleSet {
    fn open(&self, name: &str) -> std::io::Result<Option<BundleReader>> {
        Ok(self
            .archives
            .get(name)
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as BundleReader))
    }
}

/// Archives read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryBundles {
    root: PathBuf,
}

impl DirectoryBundles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleSource for DirectoryBundles {
    fn open(&self, name: &str) -> std::io::Result<Option<BundleReader>> {
        // Names are flat; anything that would walk out of `root` is unknown.
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Ok(None);
        }

        match std::fs::File::open(self.root.join(name)) {
            Ok(file) if file.metadata()?.is_file() => Ok(Some(Box::new(file))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
