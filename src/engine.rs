//! Analysis orchestration — one entry point per saved file
//!
//! Wires the baseline resolver, structural diff, downstream/test scans and
//! the confidence scorer into a single sequential pass. Collaborators are
//! constructor-injected; the engine holds no globals and no cross-file
//! locks, so independent files can be analyzed concurrently by independent
//! callers.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::baseline::{BaselineOutcome, BaselineResolution, BaselineResolver};
use crate::changes::{changed_region, ChangedRegion};
use crate::confidence::{self, ConfidenceResult, ScoreInput};
use crate::config::Config;
use crate::diagnostics::{DiagnosticsProvider, StaticDiagnostics};
use crate::diff::{semantic_diff, ChangeSet};
use crate::discovery::{discover_tests, is_test_file};
use crate::downstream::scan_downstream;
use crate::fsys::{Filesystem, OsFilesystem};
use crate::inventory::{ParseStatus, StructuralInventory};
use crate::language::language_from_path;
use crate::vcs::{GitCli, VcsClient};

/// Where the current content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOrigin {
    /// An unsaved editor buffer
    Buffer,
    /// The file on disk
    Disk,
}

/// The current content of the analyzed file. Created per analysis call,
/// never mutated.
#[derive(Debug, Clone)]
pub struct SourceVersion {
    pub text: String,
    pub origin: TextOrigin,
}

impl SourceVersion {
    pub fn buffer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: TextOrigin::Buffer,
        }
    }

    pub fn disk(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: TextOrigin::Disk,
        }
    }
}

/// Kind of a report issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportIssueKind {
    /// A file that depends on a changed symbol
    DownstreamDependency,
    /// A changed symbol with no discovered test coverage
    MissingCoverage,
}

/// One actionable finding in the report
#[derive(Debug, Clone, Serialize)]
pub struct ReportIssue {
    pub kind: ReportIssueKind,
    pub target: String,
}

/// Composed impact of one edit. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    pub source_file: PathBuf,
    /// Changed symbol names (functions first, then classes)
    pub functions: Vec<String>,
    pub downstream_files: Vec<PathBuf>,
    pub tests: Vec<PathBuf>,
    pub issues: Vec<ReportIssue>,
}

impl ImpactReport {
    fn empty(source_file: &Path) -> Self {
        Self {
            source_file: source_file.to_path_buf(),
            functions: Vec::new(),
            downstream_files: Vec::new(),
            tests: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.downstream_files.is_empty() && self.tests.is_empty()
    }
}

/// Everything one analysis call produces
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub resolution: BaselineResolution,
    pub changes: ChangeSet,
    pub report: ImpactReport,
    pub confidence: ConfidenceResult,
    /// Parse health of the current text; `None` when the equality fast
    /// path made parsing unnecessary
    pub parse_status: Option<ParseStatus>,
}

impl Analysis {
    /// Whether the edit changed any contract at all
    pub fn has_impact(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Change impact analysis engine.
///
/// Owns the session caches; collaborators are injected at construction so
/// the engine carries no implicit dependency on any particular runtime.
///
/// # Example
///
/// ```no_run
/// use ripple::{Config, ImpactEngine};
///
/// let engine = ImpactEngine::with_defaults("/path/to/repo", Config::default());
/// let analysis = engine.analyze_file(std::path::Path::new("src/app.ts"))?;
/// if analysis.has_impact() {
///     println!("{} downstream file(s)", analysis.report.downstream_files.len());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct ImpactEngine {
    vcs: Box<dyn VcsClient>,
    fs: Box<dyn Filesystem>,
    diagnostics: Box<dyn DiagnosticsProvider>,
    config: Config,
    inventory: StructuralInventory,
    resolver: BaselineResolver,
}

impl ImpactEngine {
    /// Create an engine with explicit collaborators
    pub fn new(
        vcs: Box<dyn VcsClient>,
        fs: Box<dyn Filesystem>,
        diagnostics: Box<dyn DiagnosticsProvider>,
        config: Config,
    ) -> Self {
        Self {
            vcs,
            fs,
            diagnostics,
            config,
            inventory: StructuralInventory::new(),
            resolver: BaselineResolver::new(),
        }
    }

    /// Engine over a real repository: git CLI, OS filesystem, no
    /// diagnostics source
    pub fn with_defaults(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::new(
            Box::new(GitCli::new(root)),
            Box::new(OsFilesystem),
            Box::new(StaticDiagnostics::new()),
            config,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drop the session caches (baseline snapshots and resolved refs)
    pub fn clear_caches(&self) {
        self.resolver.clear();
    }

    /// Analyze the file's on-disk content
    pub fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let text = self
            .fs
            .read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.analyze(path, &SourceVersion::disk(text)))
    }

    /// Analyze one file's current content against its resolved baseline.
    ///
    /// Sequential: baseline resolution completes before the structural
    /// diff, the diff before dependency/test discovery. The confidence
    /// scorer consumes the same (before, after, diagnostics) inputs.
    pub fn analyze(&self, path: &Path, current: &SourceVersion) -> Analysis {
        let _span = tracing::info_span!("analyze", file = %path.display()).entered();

        let diagnostics = self.diagnostics.diagnostics_for(path);

        // 1. Resolve the baseline (may fall through several candidates)
        let outcome = self
            .resolver
            .resolve(&*self.vcs, &*self.fs, &self.config, path, &current.text);

        let (before, resolution) = match outcome {
            BaselineOutcome::Resolved { text, resolution } => (text, resolution),
            BaselineOutcome::Empty { resolution } => {
                // No diffable before-version: vacuously empty analysis
                return self.empty_analysis(path, resolution, &diagnostics, &current.text, None);
            }
        };

        // 2. Equality fast path — checked before any parsing
        if before == current.text {
            return self.empty_analysis(path, resolution, &diagnostics, &current.text, Some(&before));
        }

        // 3. Structural inventories for both versions
        let language = language_from_path(path);
        let before_inv = self.inventory.scan(&before, language);
        let after_inv = self.inventory.scan(&current.text, language);
        let parse_status = after_inv.status;

        // 4. Semantic diff: did any contract change?
        let changes = if parse_status == ParseStatus::Failed {
            // "Couldn't tell" must not read as "no changes"
            tracing::warn!(file = %path.display(), "Parse failed; skipping semantic diff");
            ChangeSet::default()
        } else {
            semantic_diff(&before, &current.text, &before_inv, &after_inv)
        };

        // 5. Changed region feeds the scorer regardless of impact
        let region = changed_region(&before, &current.text);

        // 6. Discovery: tests for the scorer; downstream only on impact
        let tests = if region.is_empty() {
            Vec::new()
        } else {
            discover_tests(path, &self.config)
        };

        let downstream = if changes.is_empty() {
            Default::default()
        } else {
            let deadline = self
                .config
                .scan_timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms));
            scan_downstream(path, &changes, &self.config, deadline)
        };

        // 7. Compose the report
        let report = build_report(path, &changes, downstream.files, &tests);

        // 8. Score confidence from the same inputs
        let confidence = self.score(path, &region, &current.text, Some(&before), &diagnostics, &changes, tests.len());

        // 9. Snapshot-derived baselines move forward with each save;
        //    VCS-derived ones stay put (the VCS is authoritative)
        if resolution.ref_type == crate::baseline::RefType::Snapshot {
            self.resolver.record_snapshot(path, &current.text);
        }

        Analysis {
            resolution,
            changes,
            report,
            confidence,
            parse_status: Some(parse_status),
        }
    }

    /// Empty analysis for the fast paths: no changes, empty report,
    /// maximal confidence
    fn empty_analysis(
        &self,
        path: &Path,
        resolution: BaselineResolution,
        diagnostics: &[crate::diagnostics::Diagnostic],
        current_text: &str,
        before: Option<&str>,
    ) -> Analysis {
        let region = ChangedRegion::default();
        let changes = ChangeSet::default();
        let confidence = self.score(path, &region, current_text, before, diagnostics, &changes, 0);
        Analysis {
            resolution,
            changes,
            report: ImpactReport::empty(path),
            confidence,
            parse_status: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn score(
        &self,
        path: &Path,
        region: &ChangedRegion,
        current_text: &str,
        prior_text: Option<&str>,
        diagnostics: &[crate::diagnostics::Diagnostic],
        changes: &ChangeSet,
        discovered_tests: usize,
    ) -> ConfidenceResult {
        confidence::score(&ScoreInput {
            region,
            current_text,
            prior_text,
            diagnostics,
            is_test_file: is_test_file(path),
            discovered_tests,
            changes,
        })
    }
}

/// Compose diff, downstream and test results into one report
fn build_report(
    path: &Path,
    changes: &ChangeSet,
    downstream_files: Vec<PathBuf>,
    tests: &[PathBuf],
) -> ImpactReport {
    if changes.is_empty() {
        // Deliberate short-circuit: no contract change, nothing downstream
        return ImpactReport::empty(path);
    }

    let mut issues: Vec<ReportIssue> = downstream_files
        .iter()
        .map(|f| ReportIssue {
            kind: ReportIssueKind::DownstreamDependency,
            target: f.display().to_string(),
        })
        .collect();

    if tests.is_empty() {
        for symbol in changes.symbols() {
            issues.push(ReportIssue {
                kind: ReportIssueKind::MissingCoverage,
                target: symbol.to_string(),
            });
        }
    }

    ImpactReport {
        source_file: path.to_path_buf(),
        functions: changes.symbols().map(str::to_string).collect(),
        downstream_files,
        tests: tests.to_vec(),
        issues,
    }
}
