//! Version-control collaborator interface
//!
//! The engine never talks to git directly — it goes through [`VcsClient`],
//! injected at construction. Every method absorbs failure into `None`/`false`
//! so a broken or absent VCS simply pushes baseline resolution down the
//! fallback chain instead of erroring the analysis.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Read-only view of a version-control repository.
///
/// All methods are total: any underlying failure (no repository, command not
/// found, bad ref) is reported as `None` or `false`, never as an error.
pub trait VcsClient: Send + Sync {
    /// Whether the file is tracked by the VCS
    fn is_tracked(&self, path: &Path) -> bool;

    /// Commit id the working tree is currently at (HEAD)
    fn current_ref(&self) -> Option<String>;

    /// Merge-base commit of HEAD and the given ref
    fn merge_base(&self, target: &str) -> Option<String>;

    /// File content at a specific commit/ref
    fn read_at_ref(&self, path: &Path, reference: &str) -> Option<String>;
}

/// `VcsClient` backed by the `git` command-line tool.
///
/// Paths handed to git are relativized against the repository root. Commands
/// run with the root as working directory.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Create a client for the repository at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository root this client operates on
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relativize a path against the repo root, using `/` separators for git
    fn rel_path(&self, path: &Path) -> Option<String> {
        // Canonicalize both sides when the plain prefix strip fails —
        // temp dirs are often reached through symlinks
        let rel = match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                let root = dunce::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
                let full = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                full.strip_prefix(&root).unwrap_or(&full).to_path_buf()
            }
        };
        let s = rel.to_str()?.replace('\\', "/");
        // Leading '-' would be parsed as a flag by git
        if s.starts_with('-') {
            tracing::warn!(path = %s, "Refusing path that looks like a git flag");
            return None;
        }
        Some(s)
    }

    /// Run git with the given args, returning stdout on success
    fn run(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to spawn git. Is git installed?");
                e
            })
            .ok()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(args = ?args, stderr = %stderr.trim(), "git command failed");
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl VcsClient for GitCli {
    fn is_tracked(&self, path: &Path) -> bool {
        let Some(rel) = self.rel_path(path) else {
            return false;
        };
        self.run(&["ls-files", "--error-unmatch", "--", rel.as_str()])
            .is_some()
    }

    fn current_ref(&self) -> Option<String> {
        let out = self.run(&["rev-parse", "HEAD"])?;
        let id = out.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    fn merge_base(&self, target: &str) -> Option<String> {
        if target.starts_with('-') {
            tracing::warn!(target, "Refusing ref that looks like a git flag");
            return None;
        }
        let out = self.run(&["merge-base", "HEAD", target])?;
        let id = out.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    fn read_at_ref(&self, path: &Path, reference: &str) -> Option<String> {
        if reference.starts_with('-') {
            tracing::warn!(reference, "Refusing ref that looks like a git flag");
            return None;
        }
        let rel = self.rel_path(path)?;
        let spec = format!("{}:{}", reference, rel);
        self.run(&["show", spec.as_str()])
    }
}

/// A `VcsClient` that reports no repository at all.
///
/// Useful when git integration is disabled or the analyzed file lives
/// outside any repository — resolution falls straight to the snapshot chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl VcsClient for NoVcs {
    fn is_tracked(&self, _path: &Path) -> bool {
        false
    }

    fn current_ref(&self) -> Option<String> {
        None
    }

    fn merge_base(&self, _target: &str) -> Option<String> {
        None
    }

    fn read_at_ref(&self, _path: &Path, _reference: &str) -> Option<String> {
        None
    }
}
