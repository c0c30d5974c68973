//! Test discovery by naming convention and directory proximity
//!
//! Locates candidate test files for a source file: sibling `{stem}.test.*`
//! style names, and files in nearby `__tests__`/`tests`/`test` directories
//! that reference the source's base name. An empty result is valid and
//! feeds the scorer as a missing-coverage signal.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;

/// Directory names that hold tests by convention
const TEST_DIRS: &[&str] = &["__tests__", "tests", "test"];

/// How many ancestor directories to probe for test directories
const MAX_ANCESTOR_LEVELS: usize = 3;

/// Find candidate test files for `source_file`, sorted and deduplicated.
pub fn discover_tests(source_file: &Path, config: &Config) -> Vec<PathBuf> {
    let _span = tracing::info_span!("discover_tests", file = %source_file.display()).entered();

    let Some(stem) = source_file.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let Some(dir) = source_file.parent() else {
        return Vec::new();
    };

    let test_globs = config.test_globs();
    let mut found = BTreeSet::new();

    // The file's own directory: name conventions only
    collect_named(dir, stem, &test_globs, &mut found);

    // Nearby dedicated test directories: name conventions, plus content
    // references to the stem
    let mut level_dir = Some(dir);
    for _ in 0..=MAX_ANCESTOR_LEVELS {
        let Some(current) = level_dir else { break };
        for test_dir in TEST_DIRS {
            let candidate = current.join(test_dir);
            if candidate.is_dir() {
                collect_named(&candidate, stem, &test_globs, &mut found);
                collect_referencing(&candidate, stem, &mut found);
            }
        }
        level_dir = current.parent();
    }

    found.into_iter().collect()
}

/// Whether a path looks like a test file by name or location.
///
/// Edits to test files get the scorer's test-metric bonus path instead of
/// a coverage penalty.
pub fn is_test_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.contains(".test.") || name.contains(".spec.") {
        return true;
    }
    if stem.ends_with("_test") || stem.starts_with("test_") {
        return true;
    }
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| TEST_DIRS.contains(&s))
    })
}

/// Does this file name follow a test convention for `stem`?
fn matches_test_name(file_name: &str, stem: &str) -> bool {
    file_name.starts_with(&format!("{stem}.test."))
        || file_name.starts_with(&format!("{stem}.spec."))
        || file_name.starts_with(&format!("{stem}_test."))
        || file_name.starts_with(&format!("test_{stem}."))
}

fn collect_named(
    dir: &Path,
    stem: &str,
    test_globs: &Option<globset::GlobSet>,
    found: &mut BTreeSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(error = %e, dir = %dir.display(), "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let by_convention = matches_test_name(name, stem);
        // Configured test globs extend the conventions, still anchored to
        // this source file by its stem
        let by_glob = test_globs
            .as_ref()
            .is_some_and(|g| g.is_match(name) && name.contains(stem));

        if by_convention || by_glob {
            found.insert(canonical(&path));
        }
    }
}

/// Any file in a dedicated test directory whose content mentions the stem
fn collect_referencing(dir: &Path, stem: &str, found: &mut BTreeSet<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(error = %e, dir = %dir.display(), "Skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) if content.contains(stem) => {
                found.insert(canonical(&path));
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, path = %path.display(), "Skipping unreadable file"),
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
