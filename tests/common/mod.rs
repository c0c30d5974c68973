//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::Project;
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Install a test subscriber once so `RUST_LOG=debug` surfaces engine spans
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A scratch project directory with automatic cleanup
pub struct Project {
    /// Temp directory (kept alive to prevent cleanup)
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file under the project root, creating parent directories
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

}

/// A scratch project that is also a git repository.
///
/// Construction returns `None` when git is not installed, so callers can
/// skip rather than fail.
pub struct GitProject {
    pub project: Project,
}

impl GitProject {
    pub fn init() -> Option<Self> {
        let project = Project::new();
        let ok = git(project.root(), &["init", "-q", "-b", "main"])?;
        if !ok {
            return None;
        }
        git(project.root(), &["config", "user.email", "test@example.com"])?;
        git(project.root(), &["config", "user.name", "Test"])?;
        Some(Self { project })
    }

    pub fn root(&self) -> &Path {
        self.project.root()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        self.project.write(rel, content)
    }

    pub fn add_all_and_commit(&self, message: &str) {
        assert_eq!(git(self.root(), &["add", "-A"]), Some(true));
        assert_eq!(
            git(self.root(), &["commit", "-q", "-m", message]),
            Some(true)
        );
    }

    pub fn checkout_new_branch(&self, name: &str) {
        assert_eq!(git(self.root(), &["checkout", "-q", "-b", name]), Some(true));
    }
}

/// Run git; `None` means git itself could not be spawned, `Some(success)`
/// otherwise
fn git(root: &Path, args: &[&str]) -> Option<bool> {
    Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .ok()
        .map(|o| o.status.success())
}
