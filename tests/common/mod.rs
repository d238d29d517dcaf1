//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{fs, io, path::Path};
use tempfile::{tempdir, TempDir};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; later calls do nothing.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}

/// Copies the fixture corpus `tests/<name>` into a fresh temporary directory.
#[allow(dead_code)]
pub fn fixture_corpus(name: &str) -> TempDir {
    init_logging();
    let temp_dir = tempdir().unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join(name);
    copy_dir_all(&src, temp_dir.path()).unwrap();
    tracing::debug!("Copied {:?} to {:?}", src, temp_dir.path());
    temp_dir
}

/// Creates a temporary directory holding `(relative path, content)` notes.
#[allow(dead_code)]
pub fn create_test_corpus(files: &[(&str, &str)]) -> TempDir {
    init_logging();
    let temp_dir = tempdir().unwrap();
    for (name, content) in files {
        let path = temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    temp_dir
}
