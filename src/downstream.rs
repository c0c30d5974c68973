//! Downstream dependency scan
//!
//! Walks the source file's directory tree looking for files that import
//! the file or reference one of its changed symbols. Deliberately a
//! conservative textual heuristic, not a reference graph: false positives
//! are tolerated, missing a real dependent is not.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use aho_corasick::AhoCorasick;
use ignore::WalkBuilder;
use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::diff::ChangeSet;
use crate::language::language_from_path;

/// Directory names never worth walking into
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".next",
    "coverage",
    ".venv",
];

/// Result of one downstream scan
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DownstreamScan {
    /// Dependent files, absolute, sorted, deduplicated
    pub files: Vec<PathBuf>,
    /// Whether the walk stopped early on the caller's deadline
    pub truncated: bool,
}

/// Scan the directory tree around `source_file` for dependents.
///
/// A candidate counts as downstream when it imports the source file by
/// name/path, or mentions a changed symbol outside that symbol's own
/// definition. The walk is synchronous and depth-first; `deadline` bounds
/// its cost — hitting it returns what was found so far, flagged truncated.
pub fn scan_downstream(
    source_file: &Path,
    changes: &ChangeSet,
    config: &Config,
    deadline: Option<Instant>,
) -> DownstreamScan {
    let _span = tracing::info_span!("scan_downstream", file = %source_file.display()).entered();

    if changes.is_empty() {
        return DownstreamScan::default();
    }
    let Some(root) = source_file.parent() else {
        return DownstreamScan::default();
    };

    let symbols: Vec<&str> = changes.symbols().collect();
    let Ok(matcher) = AhoCorasick::new(&symbols) else {
        debug!("Failed to build symbol matcher");
        return DownstreamScan::default();
    };
    let import_re = import_pattern(source_file);
    let source_globs = config.source_globs();
    let canonical_source = canonical(source_file);

    let mut files = BTreeSet::new();
    let mut truncated = false;

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_str().unwrap_or("");
            !(entry.file_type().is_some_and(|t| t.is_dir()) && EXCLUDED_DIRS.contains(&name))
        })
        .build();

    for entry in walker {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                debug!("Downstream scan hit its deadline, returning partial results");
                truncated = true;
                break;
            }
        }

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if language_from_path(path).is_none() {
            continue;
        }
        if let Some(globs) = &source_globs {
            let rel = path.strip_prefix(root).unwrap_or(path);
            if !globs.is_match(rel) {
                continue;
            }
        }

        let abs = canonical(path);
        if abs == canonical_source {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, path = %path.display(), "Skipping unreadable file");
                continue;
            }
        };

        if import_re.is_match(&content) || references_symbol(&content, &matcher, &symbols) {
            files.insert(abs);
        }
    }

    DownstreamScan {
        files: files.into_iter().collect(),
        truncated,
    }
}

/// Does the content mention a changed symbol outside its own definition?
fn references_symbol(content: &str, matcher: &AhoCorasick, symbols: &[&str]) -> bool {
    let bytes = content.as_bytes();
    for m in matcher.find_iter(content) {
        // Whole-identifier matches only
        let left_ok = m.start() == 0 || !is_ident_byte(bytes[m.start() - 1]);
        let right_ok = m.end() >= bytes.len() || !is_ident_byte(bytes[m.end()]);
        if !left_ok || !right_ok {
            continue;
        }

        let line = line_containing(content, m.start());
        let symbol = symbols[m.pattern().as_usize()];
        if crate::diff::is_definition_line(line, symbol) {
            // The candidate defines its own symbol of this name
            continue;
        }
        return true;
    }
    false
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Slice out the line containing byte offset `at`
fn line_containing(content: &str, at: usize) -> &str {
    let start = content[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = content[at..]
        .find('\n')
        .map(|i| at + i)
        .unwrap_or(content.len());
    &content[start..end]
}

/// Import/require pattern referencing the source file's stem.
///
/// Covers ES imports, CommonJS require, Python imports, and Rust
/// `use`/`mod` forms.
fn import_pattern(source_file: &Path) -> Regex {
    let stem = source_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let s = regex::escape(stem);
    Regex::new(&format!(
        r#"(?m)(?:(?:import|export)\s[^'";]*['"][^'"]*\b{s}['"])|(?:\bimport\s*\(?\s*['"][^'"]*\b{s}['"])|(?:\brequire\s*\(\s*['"][^'"]*\b{s}['"])|(?:^\s*from\s+[\w.]*\b{s}\b)|(?:^\s*import\s+[\w.]*\b{s}\b)|(?:\buse\s+[\w:{{\s]*\b{s}\b)|(?:\bmod\s+{s}\s*;)"#
    ))
    .expect("import regex from escaped stem")
}

/// Canonicalize when possible; dunce strips Windows UNC prefixes
fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
