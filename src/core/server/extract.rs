use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};

/// Unpack `zip_path` into `target_dir`, preserving the archive's directory
/// layout. Existing files are overwritten in place; nothing else under
/// `target_dir` is touched. Returns the files written.
pub fn extract_zip_file(zip_path: &Path, target_dir: &Path) -> InstallerResult<Vec<PathBuf>> {
    let zip_file = std::fs::File::open(zip_path).map_err(|source| InstallerError::StagingIo {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(zip_file)?;
    let mut written = Vec::new();

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        let rel_path = zipped.enclosed_name().ok_or_else(|| {
            InstallerError::Unexpected(format!("Unsafe zip entry path: {}", zipped.name()))
        })?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = target_dir.join(rel_path);
        if zipped.is_dir() {
            create_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            create_dir(parent)?;
        }

        remove_existing(&out_path)?;
        let mut out = std::fs::File::create(&out_path).map_err(|source| InstallerError::FileWrite {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| InstallerError::FileWrite {
            path: out_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        if let Some(mode) = zipped.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o777))
                .map_err(|source| InstallerError::FileWrite {
                    path: out_path.clone(),
                    source,
                })?;
        }

        debug!("Extracted {:?}", out_path);
        written.push(out_path);
    }

    Ok(written)
}

/// Entries from an earlier run may be read-only; unlink them before rewriting.
fn remove_existing(path: &Path) -> InstallerResult<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => {
            std::fs::remove_file(path).map_err(|source| InstallerError::FileWrite {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn create_dir(path: &Path) -> InstallerResult<()> {
    std::fs::create_dir_all(path).map_err(|source| InstallerError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            match contents {
                Some(bytes) => {
                    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                    zip.write_all(bytes).unwrap();
                }
                None => zip.add_directory(*name, SimpleFileOptions::default()).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("a.zip");
        write_zip(
            &zip_path,
            &[
                ("libraries/", None),
                ("libraries/net/fabricmc/loader.jar", Some(b"jar")),
                ("fabric-server-launch.jar", Some(b"launch")),
            ],
        );
        let target = dir.path().join("out");

        let written = extract_zip_file(&zip_path, &target).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read(target.join("libraries/net/fabricmc/loader.jar")).unwrap(),
            b"jar"
        );
        assert_eq!(
            std::fs::read(target.join("fabric-server-launch.jar")).unwrap(),
            b"launch"
        );
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("a.zip");
        write_zip(&zip_path, &[("eula.txt", Some(b"eula=false"))]);
        std::fs::write(dir.path().join("eula.txt"), b"stale and longer contents").unwrap();

        extract_zip_file(&zip_path, dir.path()).unwrap();

        assert_eq!(std::fs::read(dir.path().join("eula.txt")).unwrap(), b"eula=false");
    }

    #[cfg(unix)]
    #[test]
    fn read_only_entries_survive_reinstall() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("a.zip");
        {
            let file = std::fs::File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("start.sh", SimpleFileOptions::default().unix_permissions(0o555))
                .unwrap();
            zip.write_all(b"#!/bin/sh\n").unwrap();
            zip.finish().unwrap();
        }
        let target = dir.path().join("out");

        extract_zip_file(&zip_path, &target).unwrap();
        let second = extract_zip_file(&zip_path, &target).unwrap();

        let script = target.join("start.sh");
        assert_eq!(second, [script.clone()]);
        assert_eq!(std::fs::read(&script).unwrap(), b"#!/bin/sh\n");
        assert_eq!(
            std::fs::metadata(&script).unwrap().permissions().mode() & 0o777,
            0o555
        );
    }

    #[test]
    fn rejects_entries_escaping_target() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../escape.txt", Some(b"x"))]);
        let target = dir.path().join("out");

        assert!(extract_zip_file(&zip_path, &target).is_err());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"definitely not a zip").unwrap();

        let err = extract_zip_file(&zip_path, dir.path()).unwrap_err();

        assert!(matches!(err, InstallerError::Extraction(_)));
    }
}
