//! Configuration options recognized by the engine
//!
//! The engine only knows the shape of its configuration; discovering and
//! merging config files is the host's concern. `Config` deserializes from
//! TOML and compiles its glob patterns on demand.
//!
//! ```toml
//! baseline_mode = "pr"        # "local" (default) compares to HEAD
//! pr_target_branch = "main"   # merge-base target in pr mode
//! git_integration = true      # false skips the VCS baseline candidates
//! cache_enabled = true        # false skips the session snapshot cache
//! scan_timeout_ms = 2000      # directory-walk budget for downstream scans
//! source_patterns = ["**/*.ts", "**/*.tsx"]
//! test_patterns = ["**/*.test.ts"]
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Which "before" version the analysis compares against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMode {
    /// Compare to the file at VCS HEAD
    #[default]
    Local,
    /// Compare to the merge-base with a target ref (pull-request style)
    Pr,
}

fn default_true() -> bool {
    true
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Baseline resolution mode
    pub baseline_mode: BaselineMode,
    /// Target ref for `pr` mode merge-base (e.g. "main", "origin/develop")
    pub pr_target_branch: String,
    /// Whether VCS-backed baseline candidates are attempted at all
    #[serde(default = "default_true")]
    pub git_integration: bool,
    /// Whether the session snapshot cache participates in resolution
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Directory-walk budget in milliseconds for downstream/test scans
    pub scan_timeout_ms: Option<u64>,
    /// Globs restricting which files count as source during scans
    pub source_patterns: Vec<String>,
    /// Globs extending the test-file naming conventions
    pub test_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline_mode: BaselineMode::Local,
            pr_target_branch: "main".to_string(),
            git_integration: true,
            cache_enabled: true,
            scan_timeout_ms: None,
            source_patterns: Vec::new(),
            test_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Deserialize from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Compile `source_patterns` into a matcher.
    ///
    /// Returns `None` when no patterns are configured (meaning: all
    /// recognized source extensions are candidates). Invalid globs are
    /// logged and skipped rather than failing the analysis.
    pub fn source_globs(&self) -> Option<GlobSet> {
        compile_globs(&self.source_patterns, "source_patterns")
    }

    /// Compile `test_patterns` into a matcher, `None` when unconfigured
    pub fn test_globs(&self) -> Option<GlobSet> {
        compile_globs(&self.test_patterns, "test_patterns")
    }
}

fn compile_globs(patterns: &[String], field: &str) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    let mut added = 0usize;
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
                added += 1;
            }
            Err(e) => {
                tracing::warn!(pattern = %pattern, field, error = %e, "Skipping invalid glob");
            }
        }
    }
    if added == 0 {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(e) => {
            tracing::warn!(field, error = %e, "Failed to build glob set");
            None
        }
    }
}
