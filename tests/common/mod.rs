//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Create a small vault directory under `temp_dir`.
///
/// Listed notes, in walk order: `index.md`, `log/2024-01-01.md`, `projects/alpha.md`,
/// `projects/beta.md`. A hidden `.obsidian/` note and a non-note `notes.txt` are present but
/// never listed.
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("vault");
    std::fs::create_dir(&root).unwrap();

    write(
        &root,
        "index.md",
        "# Index\n\nStart at [[projects/alpha]], then [[Beta]].\nStill to write: [[missing]]\n",
    );
    write(&root, "log/2024-01-01.md", "Worked on [[alpha|Alpha]] today.\n");
    write(&root, "projects/alpha.md", "Back to the [[index]].\n");
    write(&root, "projects/beta.md", "No references here.\n");
    write(&root, ".obsidian/workspace.md", "[[index]]\n");
    write(&root, "notes.txt", "[[index]]\n");

    root
}
