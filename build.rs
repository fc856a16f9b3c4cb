use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const BUNDLE_DIR: &str = "resources/bundles";

fn ensure_bundle_resources_placeholder(bundle_dir: &Path) {
    let placeholder = bundle_dir.join(".keep");

    if let Err(error) = fs::create_dir_all(bundle_dir) {
        panic!("failed to create bundled archive directory: {error}");
    }

    if !placeholder.exists() {
        if let Err(error) = fs::write(&placeholder, b"bundled server archives placeholder\n") {
            panic!("failed to create bundled archive placeholder file: {error}");
        }
    }
}

fn bundled_archives(bundle_dir: &Path) -> Vec<PathBuf> {
    let mut archives: Vec<PathBuf> = match fs::read_dir(bundle_dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == "zip"))
            .collect(),
        Err(error) => panic!("failed to read bundled archive directory: {error}"),
    };
    archives.sort();
    archives
}

// Emits `BUNDLED_ARCHIVES`, a name -> bytes table included by `core::bundle`.
fn write_bundle_index(archives: &[PathBuf], out_dir: &Path) {
    let mut index = String::from("pub static BUNDLED_ARCHIVES: &[(&str, &[u8])] = &[\n");
    for path in archives {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let absolute = path.display().to_string();
        let _ = writeln!(index, "    ({name:?}, include_bytes!({absolute:?})),");
    }
    index.push_str("];\n");

    if let Err(error) = fs::write(out_dir.join("bundled_archives.rs"), index) {
        panic!("failed to write bundled archive index: {error}");
    }
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(error) => panic!("OUT_DIR not set: {error}"),
    };
    let bundle_dir = manifest_dir.join(BUNDLE_DIR);

    println!("cargo:rerun-if-changed={BUNDLE_DIR}");
    ensure_bundle_resources_placeholder(&bundle_dir);

    let archives = bundled_archives(&bundle_dir);
    for archive in &archives {
        println!("cargo:rerun-if-changed={}", archive.display());
    }
    write_bundle_index(&archives, &out_dir);
}
